//! HTTP API server.
//!
//! This module implements the REST API the configuration-management agent
//! talks to. Built on Axum; the versioned routes live in [`v1`].

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

pub mod v1;

pub use v1::AppState;

/// Build the complete router with all API versions mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", v1::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `listen` until `running` is cancelled.
pub async fn serve(listen: &str, state: AppState, running: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| Error::Api(format!("binding {}: {}", listen, e)))?;
    info!(address = %listener.local_addr()?, "API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { running.cancelled().await })
        .await?;

    trace!("API server stopped.");
    Ok(())
}
