//! # Focusly Core Library
//!
//! This library provides the pomodoro logic behind the Focusly timer view.
//! The terminal front end (`focusly-cli`) is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Pomodoro Engine**: A one-second countdown state machine; the caller
//!   invokes `tick()` once per elapsed second
//! - **Timer Driver**: Owns the engine and its single periodic ticker on a
//!   Tokio runtime, publishing events and display snapshots
//! - **Storage**: TOML-based configuration and SQLite-based per-user settings
//!
//! ## Key Components
//!
//! - [`PomodoroEngine`]: Core timer state machine
//! - [`TimerDriver`]: Periodic tick loop and subscriptions
//! - [`Config`]: Application configuration management
//! - [`Database`]: Per-user settings persistence
//! - [`SoundPlayer`]: Alert playback at phase boundaries

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use storage::{Config, Database, SettingsProvider};
pub use timer::{
    CommandPlayer, Phase, PomodoroConfig, PomodoroEngine, Schedule, SessionState, SilentPlayer,
    SoundEffect, SoundError, SoundPlayer, TimerDriver, TimerSnapshot, TimerState,
};
