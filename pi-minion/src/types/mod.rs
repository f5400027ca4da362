//! Small value types shared across modules.

mod i2c_address;
mod pin_level;

pub use i2c_address::I2cAddress;
pub use pin_level::PinLevel;
