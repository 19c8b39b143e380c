mod config;
mod driver;
mod engine;
mod schedule;
mod sound;

pub use config::PomodoroConfig;
pub use driver::TimerDriver;
pub use engine::{Phase, PomodoroEngine, SessionState, TimerSnapshot, TimerState};
pub use schedule::{Schedule, Step};
pub use sound::{CommandPlayer, SilentPlayer, SoundEffect, SoundError, SoundPlayer};
