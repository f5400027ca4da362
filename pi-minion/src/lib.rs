//! Raspberry Pi hardware access for configuration-management agents.
//!
//! The daemon exposes GPIO pin reads, single-byte i2c transfers and a pair
//! of audio playback triggers over a local HTTP API. Hardware is reached
//! through the traits in [`hw_trait`], so everything above that layer can
//! be exercised without a Pi attached.

pub mod api;
pub mod api_client;
pub mod audio;
pub mod bus;
pub mod capability;
pub mod config;
pub mod error;
pub mod gpio;
pub mod hw_trait;
pub mod service;
pub mod tracing;
pub mod types;
