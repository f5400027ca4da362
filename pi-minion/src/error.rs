//! Common error types for pi-minion.
//!
//! This module provides a centralized Error enum using thiserror,
//! with conversions from underlying error types used throughout the crate.

use thiserror::Error;

/// Main error type for pi-minion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from tokio or std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GPIO peripheral errors
    #[cfg(target_os = "linux")]
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// i2c bus errors
    #[cfg(target_os = "linux")]
    #[error("I2C error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    /// Hardware communication errors not covered by a driver error type
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pin number outside the BCM range
    #[error("Invalid GPIO pin {0} (BCM pins are 0-53)")]
    InvalidPin(u8),

    /// Address that cannot be used for an i2c device
    #[error("Invalid i2c address 0x{0:02X} (valid range is 0x03-0x77)")]
    InvalidAddress(u16),

    /// A bus is already open and a different one was requested
    #[error("i2c bus {open} is already open, refusing request for bus {requested}")]
    BusConflict {
        /// Bus number held by the cache
        open: u8,
        /// Bus number the caller asked for
        requested: u8,
    },

    /// Operation whose hardware was not detected at startup
    #[error("{0} is not available on this system")]
    Unavailable(&'static str),

    /// API errors
    #[error("API error: {0}")]
    Api(String),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
