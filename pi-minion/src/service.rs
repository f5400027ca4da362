//! The operations exposed to the agent.
//!
//! `Service` owns the hardware: the pin reader, the i2c bus cache and the
//! audio player. Each is optional so the daemon can build a service holding
//! only what the capability probe found; calling an operation whose
//! hardware is absent fails with [`Error::Unavailable`].

use crate::audio::{PlaybackStatus, Player, Track};
use crate::bus::{BusCache, BusVersion};
use crate::capability::{Availability, Capabilities};
use crate::error::{Error, Result};
use crate::gpio::PinReader;
use crate::hw_trait::{I2cOpener, InputPins};
use crate::tracing::prelude::*;
use crate::types::{I2cAddress, PinLevel};

pub struct Service {
    pins: Option<PinReader>,
    bus: Option<BusCache>,
    bus_version: BusVersion,
    player: Option<Player>,
}

impl Service {
    /// Create a service with no hardware attached.
    pub fn new(bus_version: BusVersion) -> Self {
        Self {
            pins: None,
            bus: None,
            bus_version,
            player: None,
        }
    }

    pub fn with_pins(mut self, pins: impl InputPins + 'static) -> Self {
        self.pins = Some(PinReader::new(pins));
        self
    }

    /// Attach an i2c opener. The bus itself is opened on first transfer.
    pub fn with_bus(mut self, opener: impl I2cOpener + 'static) -> Self {
        self.bus = Some(BusCache::new(opener));
        self
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.player = Some(player);
        self
    }

    /// Attach pins opened by `open` if the probe found GPIO.
    ///
    /// The device node can be present while the driver still refuses to
    /// start (an unrecognised board, for one). In that case GPIO is marked
    /// unavailable in `caps` and the service carries on without it.
    pub fn with_pins_from<P, F>(self, caps: &mut Capabilities, open: F) -> Self
    where
        P: InputPins + 'static,
        F: FnOnce() -> Result<P>,
    {
        if !caps.gpio.is_available() {
            return self;
        }
        match open() {
            Ok(pins) => self.with_pins(pins),
            Err(e) => {
                warn!(error = %e, "GPIO device present but driver failed to start");
                caps.gpio = Availability::unavailable(e.to_string());
                self
            }
        }
    }

    /// Build the service for this host from the probe result.
    ///
    /// `caps` is updated when hardware that passed the probe fails to
    /// initialize, so it always describes what the service can do.
    #[cfg(target_os = "linux")]
    pub fn for_host(config: &crate::config::Config, caps: &mut Capabilities) -> Self {
        use crate::hw_trait::linux::{LinuxI2cOpener, LinuxPins};

        let mut service = Self::new(config.i2c.version).with_pins_from(caps, LinuxPins::new);
        if caps.i2c.is_available() {
            service = service.with_bus(LinuxI2cOpener);
        }
        if caps.audio.is_available() {
            service = service.with_player(Player::new(&config.audio));
        }
        service
    }

    /// Bus number of the open i2c bus, if one has been opened.
    pub fn open_bus(&self) -> Option<u8> {
        self.bus.as_ref()?.current().map(|handle| handle.bus())
    }

    /// Configure `pin` as an input and read it.
    pub async fn pin_status(&self, pin: u8) -> Result<PinLevel> {
        self.pins
            .as_ref()
            .ok_or(Error::Unavailable("gpio"))?
            .pin_status(pin)
            .await
    }

    /// Write one byte to the device at `address`.
    pub async fn i2c_write(&self, address: I2cAddress, value: u8) -> Result<bool> {
        let handle = self.bus()?.acquire(self.bus_version)?;
        handle.write_byte(address, value).await?;
        debug!(bus = handle.bus(), %address, value, "i2c write");
        Ok(true)
    }

    /// Read one byte from the device at `address`.
    pub async fn i2c_read(&self, address: I2cAddress) -> Result<u8> {
        let handle = self.bus()?.acquire(self.bus_version)?;
        let value = handle.read_byte(address).await?;
        debug!(bus = handle.bus(), %address, value, "i2c read");
        Ok(value)
    }

    /// Play `track`. Player failures are reported in the status, not as
    /// errors.
    pub async fn play(&self, track: Track) -> Result<PlaybackStatus> {
        let player = self.player.as_ref().ok_or(Error::Unavailable("audio"))?;
        Ok(player.play(track).await)
    }

    pub async fn victory(&self) -> Result<PlaybackStatus> {
        self.play(Track::Victory).await
    }

    pub async fn khan(&self) -> Result<PlaybackStatus> {
        self.play(Track::Khan).await
    }

    fn bus(&self) -> Result<&BusCache> {
        self.bus.as_ref().ok_or(Error::Unavailable("i2c"))
    }
}
