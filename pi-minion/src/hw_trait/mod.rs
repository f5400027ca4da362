//! Hardware abstraction layer traits.
//!
//! This module defines the hardware interface traits (I2C and GPIO input)
//! that the service is written against. On Linux the implementations in
//! [`linux`] talk to the Pi peripherals through `rppal`; tests substitute
//! in-memory doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{I2cAddress, PinLevel};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(test)]
pub mod mock;

/// An open connection to one i2c bus.
///
/// Transfers are single SMBus bytes ("send byte" / "receive byte"); the
/// device address is part of every call so one connection can reach any
/// device on the bus.
#[async_trait]
pub trait I2c: Send {
    /// Write one byte to the device at `address`.
    async fn write_byte(&mut self, address: I2cAddress, value: u8) -> Result<()>;

    /// Read one byte from the device at `address`.
    async fn read_byte(&mut self, address: I2cAddress) -> Result<u8>;
}

/// Opens numbered i2c buses.
pub trait I2cOpener: Send + Sync {
    fn open(&self, bus: u8) -> Result<Box<dyn I2c>>;
}

/// GPIO pins used as digital inputs.
#[async_trait]
pub trait InputPins: Send {
    /// Configure `pin` (BCM numbering) as an input and read its level.
    ///
    /// The input configuration is applied on every call, so a read never
    /// depends on what an earlier call did to the pin.
    async fn read_input(&mut self, pin: u8) -> Result<PinLevel>;
}
