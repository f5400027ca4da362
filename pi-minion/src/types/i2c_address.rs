//! Validated 7-bit i2c device address.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// A 7-bit i2c device address.
///
/// Addresses `0x00..=0x02` (general call, CBUS, alternate bus formats) and
/// `0x78..=0x7F` (10-bit addressing and future use) are reserved by the bus
/// specification and rejected on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Lowest address available to ordinary devices.
    pub const MIN: u8 = 0x03;

    /// Highest address available to ordinary devices.
    pub const MAX: u8 = 0x77;

    /// Address used when the caller does not name one.
    pub const DEFAULT: I2cAddress = I2cAddress(0x04);

    /// Validate a raw address.
    pub fn new(raw: u16) -> Result<Self> {
        match u8::try_from(raw) {
            Ok(addr) if (Self::MIN..=Self::MAX).contains(&addr) => Ok(Self(addr)),
            _ => Err(Error::InvalidAddress(raw)),
        }
    }

    /// The address as sent on the wire.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for I2cAddress {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u16> for I2cAddress {
    type Error = Error;

    fn try_from(raw: u16) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<I2cAddress> for u16 {
    fn from(addr: I2cAddress) -> u16 {
        addr.0 as u16
    }
}

/// Parses decimal (`4`) or hex with a `0x` prefix (`0x04`).
impl FromStr for I2cAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => s.parse::<u16>(),
        };
        let raw = parsed.map_err(|_| Error::Api(format!("'{}' is not an i2c address", s)))?;
        Self::new(raw)
    }
}

impl std::fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
