//! In-memory hardware doubles for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{I2c, I2cOpener, InputPins};
use crate::error::{Error, Result};
use crate::types::{I2cAddress, PinLevel};

/// One transfer seen by a [`MockBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cOp {
    Write { bus: u8, address: u8, value: u8 },
    Read { bus: u8, address: u8 },
}

/// Opener that counts opens and records every transfer on the buses it
/// hands out.
#[derive(Clone, Default)]
pub struct MockOpener {
    pub opens: Arc<AtomicUsize>,
    pub ops: Arc<Mutex<Vec<I2cOp>>>,
    pub registers: Arc<Mutex<HashMap<u8, u8>>>,
    pub fail_open: bool,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn ops(&self) -> Vec<I2cOp> {
        self.ops.lock().clone()
    }
}

impl I2cOpener for MockOpener {
    fn open(&self, bus: u8) -> Result<Box<dyn I2c>> {
        if self.fail_open {
            return Err(Error::Hardware(format!("no such bus: /dev/i2c-{}", bus)));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBus {
            bus,
            ops: self.ops.clone(),
            registers: self.registers.clone(),
        }))
    }
}

/// A bus where each device holds the last byte written to it. Reading a
/// device that was never written NAKs.
pub struct MockBus {
    bus: u8,
    ops: Arc<Mutex<Vec<I2cOp>>>,
    registers: Arc<Mutex<HashMap<u8, u8>>>,
}

#[async_trait]
impl I2c for MockBus {
    async fn write_byte(&mut self, address: I2cAddress, value: u8) -> Result<()> {
        self.ops.lock().push(I2cOp::Write {
            bus: self.bus,
            address: address.get(),
            value,
        });
        self.registers.lock().insert(address.get(), value);
        Ok(())
    }

    async fn read_byte(&mut self, address: I2cAddress) -> Result<u8> {
        self.ops.lock().push(I2cOp::Read {
            bus: self.bus,
            address: address.get(),
        });
        self.registers
            .lock()
            .get(&address.get())
            .copied()
            .ok_or_else(|| Error::Hardware(format!("NAK from {}", address)))
    }
}

/// GPIO double. Records the pins configured as input, in call order.
#[derive(Clone, Default)]
pub struct MockPins {
    pub levels: Arc<Mutex<HashMap<u8, PinLevel>>>,
    pub configured: Arc<Mutex<Vec<u8>>>,
}

impl MockPins {
    pub fn with_level(self, pin: u8, level: PinLevel) -> Self {
        self.levels.lock().insert(pin, level);
        self
    }

    pub fn configured(&self) -> Vec<u8> {
        self.configured.lock().clone()
    }
}

#[async_trait]
impl InputPins for MockPins {
    async fn read_input(&mut self, pin: u8) -> Result<PinLevel> {
        self.configured.lock().push(pin);
        Ok(self
            .levels
            .lock()
            .get(&pin)
            .copied()
            .unwrap_or(PinLevel::Low))
    }
}
