//! Audio playback through an external player.
//!
//! Each track is a fixed file handed to a player binary (`mpg321` by
//! default). The player runs to completion and its exit status comes back
//! as a [`PlaybackStatus`] value. Nothing here returns an error: a missing
//! file or player is just an unsuccessful status.

use serde::{Deserialize, Serialize};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::config::AudioConfig;
use crate::tracing::prelude::*;

/// Exit code reported when the player could not be started, matching what
/// a shell returns for a command it cannot find.
pub const SPAWN_FAILED_CODE: i32 = 127;

/// Playable tracks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Track {
    /// Final Fantasy V victory fanfare
    Victory,
    /// "Khan!!!"
    Khan,
}

/// How a playback attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Player ran and exited with `code`
    Exited { code: i32 },
    /// Player was killed by `signal`
    Signaled { signal: i32 },
    /// Player could not be started
    SpawnFailed { reason: String },
}

impl PlaybackStatus {
    pub fn success(&self) -> bool {
        matches!(self, PlaybackStatus::Exited { code: 0 })
    }

    /// Shell-style numeric status.
    pub fn code(&self) -> i32 {
        match self {
            PlaybackStatus::Exited { code } => *code,
            PlaybackStatus::Signaled { signal } => 128 + signal,
            PlaybackStatus::SpawnFailed { .. } => SPAWN_FAILED_CODE,
        }
    }
}

impl From<ExitStatus> for PlaybackStatus {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => PlaybackStatus::Exited { code },
            (None, Some(signal)) => PlaybackStatus::Signaled { signal },
            // Neither a code nor a signal only happens for stopped children,
            // which `wait` does not report.
            (None, None) => PlaybackStatus::Exited { code: -1 },
        }
    }
}

/// Runs the player for a track.
#[derive(Debug, Clone)]
pub struct Player {
    program: PathBuf,
    working_dir: PathBuf,
    victory: PathBuf,
    khan: PathBuf,
}

impl Player {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            program: config.player.clone(),
            working_dir: config.working_dir.clone(),
            victory: config.victory.clone(),
            khan: config.khan.clone(),
        }
    }

    /// File played for `track`.
    pub fn file(&self, track: Track) -> &Path {
        match track {
            Track::Victory => &self.victory,
            Track::Khan => &self.khan,
        }
    }

    /// Play `track` and wait for the player to exit.
    pub async fn play(&self, track: Track) -> PlaybackStatus {
        let file = self.file(track);
        info!(%track, file = %file.display(), "Starting playback");

        // Players report progress on stderr for the whole track, so none of
        // the child's output is kept.
        let exit = Command::new(&self.program)
            .arg(file)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        let status = match exit {
            Ok(exit) => {
                let status = PlaybackStatus::from(exit);
                if !status.success() {
                    warn!(%track, code = status.code(), "Player exited unsuccessfully");
                }
                status
            }
            Err(e) => {
                warn!(
                    %track,
                    player = %self.program.display(),
                    error = %e,
                    "Failed to start player"
                );
                PlaybackStatus::SpawnFailed {
                    reason: e.to_string(),
                }
            }
        };

        debug!(%track, code = status.code(), "Playback finished");
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn player(program: &str, dir: &Path) -> Player {
        Player::new(&AudioConfig {
            enabled: true,
            player: PathBuf::from(program),
            working_dir: dir.to_path_buf(),
            victory: dir.join("victory.mp3"),
            khan: PathBuf::from("khan.mp3"),
        })
    }

    #[test]
    fn test_track_names() {
        assert_eq!(Track::Victory.to_string(), "victory");
        assert_eq!("KHAN".parse::<Track>().unwrap(), Track::Khan);
        assert!("fanfare".parse::<Track>().is_err());
        assert_eq!(Track::iter().count(), 2);
    }

    #[test]
    fn test_status_codes() {
        assert!(PlaybackStatus::Exited { code: 0 }.success());
        assert!(!PlaybackStatus::Exited { code: 1 }.success());
        assert_eq!(PlaybackStatus::Signaled { signal: 9 }.code(), 137);
        let failed = PlaybackStatus::SpawnFailed {
            reason: "gone".into(),
        };
        assert!(!failed.success());
        assert_eq!(failed.code(), SPAWN_FAILED_CODE);
    }

    #[test]
    fn test_status_json_shape() {
        let json = serde_json::to_value(PlaybackStatus::Exited { code: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "exited", "code": 2}));
    }

    #[tokio::test]
    async fn test_missing_file_is_nonzero_status() {
        let dir = tempfile::tempdir().unwrap();
        let status = player("cat", dir.path()).play(Track::Victory).await;

        assert!(!status.success());
        assert!(matches!(status, PlaybackStatus::Exited { code } if code != 0));
    }

    #[tokio::test]
    async fn test_missing_player_is_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let status = player("/nonexistent/mpg321", dir.path())
            .play(Track::Victory)
            .await;

        assert!(matches!(status, PlaybackStatus::SpawnFailed { .. }));
        assert_eq!(status.code(), SPAWN_FAILED_CODE);
    }

    #[tokio::test]
    async fn test_chatty_player_output_discarded() {
        let dir = tempfile::tempdir().unwrap();
        // sh runs the "track" as a script that floods stderr like a player
        // printing progress frames.
        std::fs::write(
            dir.path().join("victory.mp3"),
            "i=0\nwhile [ $i -lt 20000 ]; do echo \"Frame# $i\" >&2; i=$((i+1)); done\n",
        )
        .unwrap();

        let status = player("sh", dir.path()).play(Track::Victory).await;
        assert_eq!(status, PlaybackStatus::Exited { code: 0 });
    }

    #[tokio::test]
    async fn test_relative_file_resolves_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("khan.mp3"), b"KHAAAN").unwrap();

        let status = player("cat", dir.path()).play(Track::Khan).await;
        assert_eq!(status, PlaybackStatus::Exited { code: 0 });
    }
}
