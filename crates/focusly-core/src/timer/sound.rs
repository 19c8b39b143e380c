//! Alert sounds played at phase boundaries.
//!
//! Playback is fire-and-forget: the engine calls [`SoundPlayer::play`] and
//! only logs a failure. Nothing here may block the tick loop.

use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum SoundEffect {
    #[default]
    Bell,
    Alarm,
    Analog,
    Bird,
    ChurchBell,
    Digital,
    Fancy,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 7] = [
        SoundEffect::Bell,
        SoundEffect::Alarm,
        SoundEffect::Analog,
        SoundEffect::Bird,
        SoundEffect::ChurchBell,
        SoundEffect::Digital,
        SoundEffect::Fancy,
    ];

    /// Identifier as stored in settings.
    pub fn id(&self) -> &'static str {
        match self {
            SoundEffect::Bell => "BELL",
            SoundEffect::Alarm => "ALARM",
            SoundEffect::Analog => "ANALOG",
            SoundEffect::Bird => "BIRD",
            SoundEffect::ChurchBell => "CHURCH_BELL",
            SoundEffect::Digital => "DIGITAL",
            SoundEffect::Fancy => "FANCY",
        }
    }

    /// Asset file name handed to external players.
    pub fn asset(&self) -> &'static str {
        match self {
            SoundEffect::Bell => "bell.mp3",
            SoundEffect::Alarm => "alarm.mp3",
            SoundEffect::Analog => "analog.mp3",
            SoundEffect::Bird => "bird.mp3",
            SoundEffect::ChurchBell => "church_bell.mp3",
            SoundEffect::Digital => "digital.mp3",
            SoundEffect::Fancy => "fancy.mp3",
        }
    }
}

impl fmt::Display for SoundEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SoundEffect {
    type Err = ConfigError;

    /// Accepts `BELL`, `bell`, `church_bell` and `church-bell` style ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        SoundEffect::ALL
            .into_iter()
            .find(|effect| effect.id() == normalized)
            .ok_or_else(|| {
                ConfigError::invalid("sound_effect", format!("unknown sound effect '{s}'"))
            })
    }
}

impl TryFrom<String> for SoundEffect {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Error, Debug)]
pub enum SoundError {
    #[error("failed to launch sound command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sound output unavailable: {0}")]
    Unavailable(String),
}

/// Plays the alert for a finished phase.
///
/// Implementations must return promptly; the engine never waits for the
/// sound to finish.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, effect: SoundEffect, volume: f64) -> Result<(), SoundError>;
}

/// Player that discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self, _effect: SoundEffect, _volume: f64) -> Result<(), SoundError> {
        Ok(())
    }
}

/// Spawns an external program per alert: `<program> <args..> <asset> <volume>`.
///
/// The child is reaped on a detached thread so the caller returns as soon
/// as the process has been launched.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a whitespace-separated command line such as `paplay --volume`.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&self, effect: SoundEffect, volume: f64) -> Result<(), SoundError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(effect.asset())
            .arg(format!("{volume:.2}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SoundError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}
