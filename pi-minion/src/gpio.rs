//! GPIO pin status reads.

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::hw_trait::InputPins;
use crate::tracing::prelude::*;
use crate::types::PinLevel;

/// Highest BCM GPIO number on the BCM283x family.
pub const MAX_PIN: u8 = 53;

/// Parse a BCM pin number from text, rejecting pins past [`MAX_PIN`].
pub fn parse_pin(s: &str) -> Result<u8> {
    let pin = s
        .trim()
        .parse::<u16>()
        .map_err(|_| Error::Api(format!("'{}' is not a GPIO pin", s)))?;
    match u8::try_from(pin) {
        Ok(pin) if pin <= MAX_PIN => Ok(pin),
        _ => Err(Error::Api(format!(
            "Invalid GPIO pin {} (BCM pins are 0-{})",
            pin, MAX_PIN
        ))),
    }
}

/// Reads digital input pins.
///
/// Every read configures the pin as an input first, so reads of different
/// pins in any order are independent of one another.
pub struct PinReader {
    pins: Mutex<Box<dyn InputPins>>,
}

impl PinReader {
    pub fn new(pins: impl InputPins + 'static) -> Self {
        Self {
            pins: Mutex::new(Box::new(pins)),
        }
    }

    /// Configure `pin` as an input and return its level.
    pub async fn pin_status(&self, pin: u8) -> Result<PinLevel> {
        if pin > MAX_PIN {
            return Err(Error::InvalidPin(pin));
        }
        let level = self.pins.lock().await.read_input(pin).await?;
        debug!(pin, %level, "Read pin");
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw_trait::mock::MockPins;

    #[tokio::test]
    async fn test_reads_level() {
        let pins = MockPins::default().with_level(23, PinLevel::High);
        let reader = PinReader::new(pins);

        assert_eq!(reader.pin_status(23).await.unwrap(), PinLevel::High);
        assert_eq!(reader.pin_status(24).await.unwrap(), PinLevel::Low);
    }

    #[tokio::test]
    async fn test_every_read_configures_input() {
        let pins = MockPins::default()
            .with_level(4, PinLevel::High)
            .with_level(17, PinLevel::Low);
        let reader = PinReader::new(pins.clone());

        for pin in [4, 17, 4, 27] {
            reader.pin_status(pin).await.unwrap();
        }

        assert_eq!(pins.configured(), vec![4, 17, 4, 27]);
    }

    #[test]
    fn test_parse_pin() {
        assert_eq!(parse_pin("23").unwrap(), 23);
        assert_eq!(parse_pin("53").unwrap(), 53);
        assert!(matches!(parse_pin("54"), Err(Error::Api(_))));
        assert!(matches!(parse_pin("300"), Err(Error::Api(_))));
        assert!(matches!(parse_pin("gpio4"), Err(Error::Api(_))));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_pin() {
        let pins = MockPins::default();
        let reader = PinReader::new(pins.clone());

        assert!(matches!(reader.pin_status(54).await, Err(Error::InvalidPin(54))));
        assert!(pins.configured().is_empty());
    }
}
