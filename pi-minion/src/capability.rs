//! Startup detection of the hardware this host offers.
//!
//! The probe runs once when the daemon starts. Its result decides which API
//! routes are registered; operations whose hardware is missing are never
//! exposed rather than failing on each call.

use nix::unistd::{access, AccessFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::tracing::prelude::*;

/// Whether one kind of hardware can be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Availability::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Probe result for every hardware concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub gpio: Availability,
    pub i2c: Availability,
    pub audio: Availability,
}

impl Capabilities {
    /// Everything available. Used when the caller supplies its own hardware.
    pub fn all() -> Self {
        Self {
            gpio: Availability::Available,
            i2c: Availability::Available,
            audio: Availability::Available,
        }
    }

    /// Probe the running system against the configuration.
    pub fn detect(config: &Config) -> Self {
        let caps = Self {
            gpio: if config.gpio.enabled {
                probe_device(&config.gpio.device)
            } else {
                Availability::unavailable("disabled in configuration")
            },
            i2c: if config.i2c.enabled {
                probe_device(&config.i2c.device())
            } else {
                Availability::unavailable("disabled in configuration")
            },
            audio: if config.audio.enabled {
                match find_executable(&config.audio.player) {
                    Some(path) => {
                        debug!(player = %path.display(), "Found audio player");
                        Availability::Available
                    }
                    None => Availability::unavailable(format!(
                        "player {} not found",
                        config.audio.player.display()
                    )),
                }
            } else {
                Availability::unavailable("disabled in configuration")
            },
        };

        for (name, availability) in [
            ("gpio", &caps.gpio),
            ("i2c", &caps.i2c),
            ("audio", &caps.audio),
        ] {
            match availability {
                Availability::Available => info!(capability = name, "Available"),
                Availability::Unavailable { reason } => {
                    warn!(capability = name, %reason, "Unavailable")
                }
            }
        }

        caps
    }
}

// A device node is usable when we may both read and write it.
fn probe_device(path: &Path) -> Availability {
    match access(path, AccessFlags::R_OK | AccessFlags::W_OK) {
        Ok(()) => Availability::Available,
        Err(errno) => Availability::unavailable(format!("{}: {}", path.display(), errno.desc())),
    }
}

/// Resolve `program` the way a shell would: paths containing a slash are
/// used as given, bare names are searched for on `PATH`.
pub fn find_executable(program: &Path) -> Option<PathBuf> {
    let is_executable = |path: &Path| path.is_file() && access(path, AccessFlags::X_OK).is_ok();

    if program.components().count() > 1 || program.is_absolute() {
        return is_executable(program).then(|| program.to_path_buf());
    }

    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate.as_path()))
}
