//! Configuration management for pi-minion.
//!
//! Configuration is read from a TOML file, `/etc/pi-minion/pi-minion.toml`
//! unless `PI_MINION_CONFIG` names another one. Every field has a default,
//! so a missing default file is not an error and a partial file only needs
//! the keys it changes. A few environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bus::BusVersion;
use crate::error::{Error, Result};
use crate::tracing::prelude::*;
use crate::types::I2cAddress;

/// Location of the system-wide configuration file.
pub const DEFAULT_PATH: &str = "/etc/pi-minion/pi-minion.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV: &str = "PI_MINION_CONFIG";

/// Environment variable overriding `api.listen`.
pub const LISTEN_ENV: &str = "PI_MINION_LISTEN";

/// Environment variable overriding `i2c.version`.
pub const I2C_VERSION_ENV: &str = "PI_MINION_I2C_VERSION";

/// Main configuration structure for the daemon.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// GPIO configuration
    pub gpio: GpioConfig,

    /// i2c configuration
    pub i2c: I2cConfig,

    /// Audio playback configuration
    pub audio: AudioConfig,
}

/// Daemon process configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Log level used where RUST_LOG is silent
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Listen address
    pub listen: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:7786".to_string(),
        }
    }
}

/// GPIO configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    /// Expose pin reads when the hardware is present
    pub enabled: bool,

    /// Character device probed at startup
    pub device: PathBuf,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: PathBuf::from("/dev/gpiomem"),
        }
    }
}

/// i2c configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct I2cConfig {
    /// Expose i2c transfers when the hardware is present
    pub enabled: bool,

    /// Board revision selecting the bus (1 for bus 0, anything else bus 1)
    pub version: BusVersion,

    /// Device address used by clients that do not name one
    pub default_address: I2cAddress,

    /// Directory holding the `i2c-<N>` device nodes
    pub dev_dir: PathBuf,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version: BusVersion::default(),
            default_address: I2cAddress::DEFAULT,
            dev_dir: PathBuf::from("/dev"),
        }
    }
}

impl I2cConfig {
    /// Device node for the configured bus.
    pub fn device(&self) -> PathBuf {
        self.dev_dir.join(format!("i2c-{}", self.version.bus_number()))
    }
}

/// Audio playback configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Expose playback when the player is installed
    pub enabled: bool,

    /// Player binary, absolute or looked up on PATH
    pub player: PathBuf,

    /// Working directory for the player process
    pub working_dir: PathBuf,

    /// File played by the victory trigger
    pub victory: PathBuf,

    /// File played by the khan trigger
    pub khan: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: PathBuf::from("mpg321"),
            working_dir: PathBuf::from("/home/pi"),
            victory: PathBuf::from("/home/pi/FinalFantasyV-VictoryFanfare.mp3"),
            khan: PathBuf::from("/home/pi/Khan.mp3"),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or from the file named
    /// by `PI_MINION_CONFIG`, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path))?,
            None if Path::new(DEFAULT_PATH).exists() => Self::load_from(Path::new(DEFAULT_PATH))?,
            None => {
                debug!(path = DEFAULT_PATH, "No configuration file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.message().to_string()))
    }

    /// Apply `PI_MINION_LISTEN` and `PI_MINION_I2C_VERSION`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            self.api.listen = listen;
        }
        if let Ok(version) = std::env::var(I2C_VERSION_ENV) {
            let version = version.trim().parse::<u8>().map_err(|_| {
                Error::Config(format!("{} must be a number, got '{}'", I2C_VERSION_ENV, version))
            })?;
            self.i2c.version = BusVersion::new(version);
        }
        Ok(())
    }
}
