//! API client library.
//!
//! This module provides a Rust client for the daemon's HTTP API, used by
//! the CLI. Requests and responses reuse the payload types from
//! [`crate::api::v1`].

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::api::v1::{
    CapabilitiesResponse, ErrorResponse, I2cReadResponse, I2cWriteRequest, I2cWriteResponse,
    PinStatusResponse, PlaybackResponse,
};
use crate::audio::Track;
use crate::error::{Error, Result};
use crate::types::I2cAddress;

/// Environment variable naming the daemon's base URL.
pub const URL_ENV: &str = "PI_MINION_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_URL: &str = "http://127.0.0.1:7786";

/// Client for one daemon.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    /// Create a client for the daemon at `base_url` (e.g.
    /// `http://127.0.0.1:7786`).
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("{}/api/v1", base_url.trim_end_matches('/')),
        }
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub async fn health(&self) -> Result<String> {
        let response = self.http.get(self.url("health")).send().await.map_err(transport)?;
        let response = check(response).await?;
        response.text().await.map_err(transport)
    }

    pub async fn capabilities(&self) -> Result<CapabilitiesResponse> {
        self.get_json("capabilities").await
    }

    pub async fn pin_status(&self, pin: u8) -> Result<PinStatusResponse> {
        self.get_json(&format!("pin/{}", pin)).await
    }

    pub async fn i2c_write(&self, address: I2cAddress, value: u8) -> Result<I2cWriteResponse> {
        let response = self
            .http
            .post(self.url(&format!("i2c/{}", address)))
            .json(&I2cWriteRequest { value })
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    pub async fn i2c_read(&self, address: I2cAddress) -> Result<I2cReadResponse> {
        self.get_json(&format!("i2c/{}", address)).await
    }

    pub async fn play(&self, track: Track) -> Result<PlaybackResponse> {
        let response = self
            .http
            .post(self.url(&format!("audio/{}", track)))
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await.map_err(transport)?;
        decode(response).await
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Api(e.to_string())
}

// Turn non-success responses into errors carrying the server's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) if status == StatusCode::NOT_FOUND => {
            "operation not available on this host".to_string()
        }
        Err(_) => status.to_string(),
    };
    Err(Error::Api(format!("{}: {}", status.as_u16(), message)))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    check(response).await?.json().await.map_err(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{self, AppState};
    use crate::bus::BusVersion;
    use crate::capability::Capabilities;
    use crate::hw_trait::mock::{MockOpener, MockPins};
    use crate::service::Service;
    use crate::types::PinLevel;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_url_joining() {
        let client = Client::new("http://pi.local:7786/");
        assert_eq!(client.url("/pin/4"), "http://pi.local:7786/api/v1/pin/4");
        assert_eq!(client.url("health"), "http://pi.local:7786/api/v1/health");
    }

    // Spin up the real server on an ephemeral port.
    async fn start(state: AppState) -> (Client, CancellationToken) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = CancellationToken::new();
        let stop = running.clone();
        tokio::spawn(async move {
            axum::serve(listener, api::router(state))
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
                .unwrap();
        });
        (Client::new(&format!("http://{}", addr)), running)
    }

    #[tokio::test]
    async fn test_round_trip_through_server() {
        let pins = MockPins::default().with_level(17, PinLevel::High);
        let service = Service::new(BusVersion::default())
            .with_pins(pins)
            .with_bus(MockOpener::new());
        let (client, running) =
            start(AppState::new(service, Capabilities::all(), I2cAddress::DEFAULT)).await;

        assert_eq!(client.health().await.unwrap(), "OK");

        let pin = client.pin_status(17).await.unwrap();
        assert_eq!(pin.level, PinLevel::High);

        let addr = I2cAddress::new(0x22).unwrap();
        assert!(client.i2c_write(addr, 0x99).await.unwrap().success);
        let read = client.i2c_read(addr).await.unwrap();
        assert_eq!((read.address, read.value), (addr, 0x99));

        let caps = client.capabilities().await.unwrap();
        assert_eq!(caps.open_bus, Some(1));

        running.cancel();
    }

    #[tokio::test]
    async fn test_errors_carry_server_message() {
        let service = Service::new(BusVersion::default()).with_pins(MockPins::default());
        let (client, running) =
            start(AppState::new(service, Capabilities::all(), I2cAddress::DEFAULT)).await;

        let err = client.pin_status(99).await.unwrap_err();
        assert!(err.to_string().contains("Invalid GPIO pin 99"), "{}", err);

        let err = client
            .get_json::<PinStatusResponse>("pin/300")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400: "), "{}", err);
        assert!(err.to_string().contains("300"), "{}", err);

        running.cancel();
    }
}
