use serde::{Deserialize, Serialize};

use super::sound::SoundEffect;
use crate::error::ConfigError;

/// Durations and cycle shape of one pomodoro session.
///
/// Immutable for the lifetime of an engine. Durations are minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub work_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub long_break_interval: u32,
    pub rounds: u32,
    #[serde(default)]
    pub sound_effect: SoundEffect,
    #[serde(default = "default_volume")]
    pub sound_effect_volume: f64,
}

fn default_volume() -> f64 {
    0.5
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            rounds: 4,
            sound_effect: SoundEffect::Bell,
            sound_effect_volume: default_volume(),
        }
    }
}

impl PomodoroConfig {
    /// Check every field, failing on the first out-of-range value.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("work_duration", self.work_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
            ("long_break_interval", self.long_break_interval),
            ("rounds", self.rounds),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::invalid(key, "must be at least 1"));
            }
        }

        // Clock arithmetic is done in u32 seconds.
        for (key, value) in &positive[..3] {
            if *value > u32::MAX / 60 {
                return Err(ConfigError::invalid(key, "duration too large"));
            }
        }

        if !(0.0..=1.0).contains(&self.sound_effect_volume) {
            return Err(ConfigError::invalid(
                "sound_effect_volume",
                format!("{} is outside 0.0..=1.0", self.sound_effect_volume),
            ));
        }
        Ok(())
    }

    /// Validated copy, for callers that want to fail fast.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}
