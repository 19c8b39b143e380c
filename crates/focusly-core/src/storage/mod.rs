mod config;
pub mod database;

pub use config::{Config, SoundConfig, TimerConfig};
pub use database::{Database, UserSettings};

use std::path::PathBuf;

use crate::error::Result;
use crate::timer::PomodoroConfig;

/// Source of the configuration a pomodoro session is built from.
pub trait SettingsProvider {
    /// Fetch a validated configuration.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be read or are out of range.
    fn pomodoro_config(&self) -> Result<PomodoroConfig>;
}

/// Returns the Focusly data directory, creating it if needed.
///
/// `FOCUSLY_HOME` wins when set. Otherwise `~/.config/focusly[-dev]/`,
/// where `FOCUSLY_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSLY_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSLY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusly-dev")
            } else {
                base_dir.join("focusly")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
