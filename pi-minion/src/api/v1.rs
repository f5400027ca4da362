//! API version 1 endpoints.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    audio::{PlaybackStatus, Track},
    capability::Capabilities,
    error::Error,
    gpio::parse_pin,
    service::Service,
    types::{I2cAddress, PinLevel},
};

/// Shared application state for API endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Hardware operations
    pub service: Arc<Service>,
    /// Startup probe result, decides which routes exist
    pub capabilities: Arc<Capabilities>,
    /// Address clients should use when they have no better idea
    pub default_address: I2cAddress,
}

impl AppState {
    pub fn new(service: Service, capabilities: Capabilities, default_address: I2cAddress) -> Self {
        Self {
            service: Arc::new(service),
            capabilities: Arc::new(capabilities),
            default_address,
        }
    }
}

/// Capabilities response payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapabilitiesResponse {
    /// Startup probe result
    pub capabilities: Capabilities,
    /// Configured default i2c device address
    pub default_address: I2cAddress,
    /// i2c bus currently open, if any
    pub open_bus: Option<u8>,
}

/// Pin status response payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PinStatusResponse {
    pub pin: u8,
    pub level: PinLevel,
    /// Level as 0 or 1
    pub value: u8,
}

/// i2c write request payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I2cWriteRequest {
    /// Byte to send
    pub value: u8,
}

/// i2c write response payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I2cWriteResponse {
    pub success: bool,
}

/// i2c read response payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I2cReadResponse {
    pub address: I2cAddress,
    pub value: u8,
}

/// Playback response payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackResponse {
    pub track: Track,
    /// Whether the player exited with status 0
    pub success: bool,
    /// Shell-style exit code
    pub code: i32,
    pub status: PlaybackStatus,
}

/// API error response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Map service errors onto HTTP statuses.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::Api(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidPin(_) | Error::InvalidAddress(_) | Error::Api(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::BusConflict { .. } => StatusCode::CONFLICT,
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, "Rejected request");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint handler.
///
/// Returns a simple OK status to verify the API is running.
async fn health() -> &'static str {
    "OK"
}

/// Report which hardware was found at startup.
///
/// # Example
/// ```bash
/// curl http://localhost:7786/api/v1/capabilities
/// ```
async fn capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        capabilities: (*state.capabilities).clone(),
        default_address: state.default_address,
        open_bus: state.service.open_bus(),
    })
}

/// Read a GPIO pin, configuring it as an input first.
///
/// # Example
/// ```bash
/// curl http://localhost:7786/api/v1/pin/23
/// ```
async fn pin_status(
    State(state): State<AppState>,
    Path(pin): Path<String>,
) -> Result<Json<PinStatusResponse>, ApiError> {
    let pin = parse_pin(&pin)?;
    let level = state.service.pin_status(pin).await?;
    Ok(Json(PinStatusResponse {
        pin,
        level,
        value: level.value(),
    }))
}

/*  Write one byte to an i2c device.

    # Example

    curl -X POST http://localhost:7786/api/v1/i2c/0x04 \
       -H "Content-Type: application/json" \
       -d '{"value": 42}'
*/
async fn i2c_write(
    State(state): State<AppState>,
    Path(address): Path<String>,
    payload: Result<Json<I2cWriteRequest>, JsonRejection>,
) -> Result<Json<I2cWriteResponse>, ApiError> {
    let address: I2cAddress = address.parse()?;
    let Json(req) = payload?;
    debug!(%address, value = req.value, "API request to write i2c byte");
    let success = state.service.i2c_write(address, req.value).await?;
    Ok(Json(I2cWriteResponse { success }))
}

/// Read one byte from an i2c device.
///
/// # Example
/// ```bash
/// curl http://localhost:7786/api/v1/i2c/0x04
/// ```
async fn i2c_read(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<I2cReadResponse>, ApiError> {
    let address: I2cAddress = address.parse()?;
    let value = state.service.i2c_read(address).await?;
    Ok(Json(I2cReadResponse { address, value }))
}

/// Play a track and report how the player exited.
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:7786/api/v1/audio/victory
/// ```
async fn play(
    State(state): State<AppState>,
    Path(track): Path<String>,
) -> Result<Json<PlaybackResponse>, ApiError> {
    let track: Track = track
        .parse()
        .map_err(|_| Error::Api(format!("unknown track '{}'", track)))?;
    let status = state.service.play(track).await?;
    Ok(Json(PlaybackResponse {
        track,
        success: status.success(),
        code: status.code(),
        status,
    }))
}

/// Build the v1 API routes.
///
/// Hardware routes are only registered when the startup probe found the
/// hardware; otherwise they answer 404 like any unknown path.
pub fn routes(state: AppState) -> Router {
    let caps = state.capabilities.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/capabilities", get(capabilities));

    if caps.gpio.is_available() {
        router = router.route("/pin/:pin", get(pin_status));
    }
    if caps.i2c.is_available() {
        router = router.route("/i2c/:address", get(i2c_read).post(i2c_write));
    }
    if caps.audio.is_available() {
        router = router.route("/audio/:track", post(play));
    }

    router.with_state(state)
}
