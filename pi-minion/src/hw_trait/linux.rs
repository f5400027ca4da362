//! Linux implementations of the hardware traits on top of `rppal`.
//!
//! rppal's calls are blocking ioctls and register accesses, so each one is
//! handed to tokio's blocking pool rather than run on a worker thread.

use async_trait::async_trait;
use parking_lot::Mutex;
use rppal::gpio::Gpio;
use std::sync::Arc;

use super::{I2c, I2cOpener, InputPins};
use crate::error::{Error, Result};
use crate::tracing::prelude::*;
use crate::types::{I2cAddress, PinLevel};

// Run a blocking hardware call off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Hardware(format!("hardware task failed: {}", e)))?
}

/// Opens `/dev/i2c-<bus>` through the kernel i2c-dev driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxI2cOpener;

impl I2cOpener for LinuxI2cOpener {
    fn open(&self, bus: u8) -> Result<Box<dyn I2c>> {
        let i2c = rppal::i2c::I2c::with_bus(bus)?;
        debug!(bus, clock_hz = ?i2c.clock_speed().ok(), "Opened i2c bus");
        Ok(Box::new(LinuxI2c {
            i2c: Arc::new(Mutex::new(i2c)),
            selected: None,
        }))
    }
}

/// i2c-dev connection. The kernel keeps one target address per file
/// descriptor, so it is only reprogrammed when a call names a new device.
pub struct LinuxI2c {
    i2c: Arc<Mutex<rppal::i2c::I2c>>,
    selected: Option<I2cAddress>,
}

impl LinuxI2c {
    // Target address to program before the next transfer, if it changed.
    fn retarget(&self, address: I2cAddress) -> Option<u16> {
        (self.selected != Some(address)).then(|| {
            trace!(%address, "Selecting i2c target");
            u16::from(address)
        })
    }
}

#[async_trait]
impl I2c for LinuxI2c {
    async fn write_byte(&mut self, address: I2cAddress, value: u8) -> Result<()> {
        let retarget = self.retarget(address);
        let i2c = self.i2c.clone();
        blocking(move || {
            let mut i2c = i2c.lock();
            if let Some(addr) = retarget {
                i2c.set_slave_address(addr)?;
            }
            i2c.smbus_send_byte(value)?;
            Ok(())
        })
        .await?;
        self.selected = Some(address);
        Ok(())
    }

    async fn read_byte(&mut self, address: I2cAddress) -> Result<u8> {
        let retarget = self.retarget(address);
        let i2c = self.i2c.clone();
        let value = blocking(move || {
            let mut i2c = i2c.lock();
            if let Some(addr) = retarget {
                i2c.set_slave_address(addr)?;
            }
            Ok(i2c.smbus_receive_byte()?)
        })
        .await?;
        self.selected = Some(address);
        Ok(value)
    }
}

/// GPIO inputs through `/dev/gpiomem`.
pub struct LinuxPins {
    gpio: Gpio,
}

impl LinuxPins {
    pub fn new() -> Result<Self> {
        Ok(Self { gpio: Gpio::new()? })
    }
}

#[async_trait]
impl InputPins for LinuxPins {
    async fn read_input(&mut self, pin: u8) -> Result<PinLevel> {
        let gpio = self.gpio.clone();
        blocking(move || {
            let mut input = gpio.get(pin)?.into_input();
            // Leave the pin configured as input once the handle is released.
            input.set_reset_on_drop(false);
            Ok(PinLevel::from(input.is_high()))
        })
        .await
    }
}
