//! Pomodoro engine implementation.
//!
//! The engine is a discrete one-second countdown. It does not own a timer
//! or a thread - the caller invokes `tick()` once per elapsed second while
//! the engine is running (see [`TimerDriver`](super::TimerDriver)).
//!
//! ## State Transitions
//!
//! ```text
//! Work(n) -> ShortBreak -> Work(n+1)
//! Work(n) -> LongBreak  -> Work(n+1)       every `long_break_interval` work phases
//! Break   -> Finished                      once n+1 > rounds; only `reset()` leaves it
//! ```
//!
//! Every phase boundary stops the clock unless auto-continue is enabled,
//! in which case a running clock keeps running into the next phase.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PomodoroEngine::new(config, Arc::new(SilentPlayer))?;
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event) when a phase ends
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::config::PomodoroConfig;
use super::sound::{SilentPlayer, SoundPlayer};
use crate::error::ConfigError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Work)
    }

    /// Short label for display: "Focus" or "Break".
    pub fn label(&self) -> &'static str {
        if self.is_break() {
            "Break"
        } else {
            "Focus"
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// Where the session stands, as display surfaces see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Work { round: u32 },
    ShortBreak,
    LongBreak,
    Finished,
}

/// Mutable countdown state, owned by exactly one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub minutes_left: u32,
    /// Always within `0..=59`.
    pub seconds_left: u32,
    pub is_running: bool,
    pub phase: Phase,
    /// Work phase in progress or about to start, starting at 1.
    pub current_round: u32,
    /// Position in the long-break cycle, within `1..=long_break_interval`.
    pub completed_work_phases_in_cycle: u32,
}

impl TimerState {
    fn initial(config: &PomodoroConfig) -> Self {
        Self {
            minutes_left: config.work_duration,
            seconds_left: 0,
            is_running: false,
            phase: Phase::Work,
            current_round: 1,
            completed_work_phases_in_cycle: 1,
        }
    }

    pub fn is_break(&self) -> bool {
        self.phase.is_break()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.minutes_left * 60 + self.seconds_left
    }
}

/// Everything a display surface needs to render the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: SessionState,
    pub phase: Phase,
    pub minutes_left: u32,
    pub seconds_left: u32,
    pub is_running: bool,
    pub is_break: bool,
    pub current_round: u32,
    pub rounds: u32,
    /// 0.0 .. 1.0 progress within the current phase.
    pub progress_fraction: f64,
}

impl TimerSnapshot {
    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.minutes_left, self.seconds_left)
    }

    pub fn round_label(&self) -> String {
        format!("round {} of {}", self.current_round, self.rounds)
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }
}

/// Core pomodoro engine.
///
/// Holds a validated configuration and the single [`TimerState`] it
/// mutates. The caller is responsible for calling `tick()` once a second.
pub struct PomodoroEngine {
    config: PomodoroConfig,
    state: TimerState,
    sound: Arc<dyn SoundPlayer>,
    auto_continue: bool,
}

impl fmt::Debug for PomodoroEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PomodoroEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("auto_continue", &self.auto_continue)
            .finish_non_exhaustive()
    }
}

impl PomodoroEngine {
    /// Create an engine at the start of `Work(1)`, stopped.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the configuration is out of
    /// range. The engine never re-validates afterwards.
    pub fn new(config: PomodoroConfig, sound: Arc<dyn SoundPlayer>) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = TimerState::initial(&config);
        Ok(Self {
            config,
            state,
            sound,
            auto_continue: false,
        })
    }

    /// Engine that plays no alerts.
    pub fn silent(config: PomodoroConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(SilentPlayer))
    }

    /// Keep running across phase boundaries instead of stopping at each one.
    pub fn with_auto_continue(mut self, auto_continue: bool) -> Self {
        self.auto_continue = auto_continue;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn is_finished(&self) -> bool {
        self.state.current_round > self.config.rounds
    }

    pub fn session_state(&self) -> SessionState {
        if self.is_finished() {
            return SessionState::Finished;
        }
        match self.state.phase {
            Phase::Work => SessionState::Work {
                round: self.state.current_round,
            },
            Phase::ShortBreak => SessionState::ShortBreak,
            Phase::LongBreak => SessionState::LongBreak,
        }
    }

    /// Full length of the current phase in seconds.
    pub fn phase_total_secs(&self) -> u32 {
        let minutes = match self.state.phase {
            Phase::Work => self.config.work_duration,
            Phase::ShortBreak => self.config.short_break_duration,
            Phase::LongBreak => self.config.long_break_duration,
        };
        minutes * 60
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.phase_total_secs();
        if total == 0 {
            return 0.0;
        }
        let fraction = 1.0 - f64::from(self.state.remaining_secs()) / f64::from(total);
        fraction.clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.session_state(),
            phase: self.state.phase,
            minutes_left: self.state.minutes_left,
            seconds_left: self.state.seconds_left,
            is_running: self.state.is_running,
            is_break: self.state.is_break(),
            current_round: self.state.current_round,
            rounds: self.config.rounds,
            progress_fraction: self.progress_fraction(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the countdown. Rejected once the session has finished.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_finished() {
            tracing::debug!("start ignored: session finished, reset required");
            return None;
        }
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        Some(Event::TimerStarted {
            phase: self.state.phase,
            current_round: self.state.current_round,
            remaining_secs: self.state.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Freeze the countdown at its current value.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            remaining_secs: self.state.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// The tick that reaches `00:00` ends the phase; there is no extra tick
    /// spent showing zero. Does nothing while stopped.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        let state = &mut self.state;
        if state.seconds_left > 0 {
            state.seconds_left -= 1;
        } else if state.minutes_left > 0 {
            state.minutes_left -= 1;
            state.seconds_left = 59;
        } else {
            return self.transition(false);
        }

        if state.minutes_left == 0 && state.seconds_left == 0 {
            return self.transition(false);
        }
        None
    }

    /// End the current phase now, as if its time had run out.
    pub fn complete_phase(&mut self) -> Option<Event> {
        self.transition(false)
    }

    /// End the current phase now, discarding the remaining time.
    pub fn skip(&mut self) -> Option<Event> {
        self.transition(true)
    }

    /// Back to `Work(1)` at `work_duration:00`, stopped.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::initial(&self.config);
        Some(Event::TimerReset { at: Utc::now() })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn transition(&mut self, skipped: bool) -> Option<Event> {
        if self.is_finished() {
            self.state.is_running = false;
            return None;
        }

        let from = self.state.phase;
        let was_running = self.state.is_running;
        let state = &mut self.state;
        state.is_running = false;

        match from {
            Phase::ShortBreak | Phase::LongBreak => {
                state.phase = Phase::Work;
                state.minutes_left = self.config.work_duration;
                state.current_round += 1;
                // A long break already restarted the cycle at 1.
                if from == Phase::ShortBreak {
                    state.completed_work_phases_in_cycle += 1;
                }
            }
            Phase::Work => {
                if state.completed_work_phases_in_cycle >= self.config.long_break_interval {
                    state.phase = Phase::LongBreak;
                    state.minutes_left = self.config.long_break_duration;
                    state.completed_work_phases_in_cycle = 1;
                } else {
                    state.phase = Phase::ShortBreak;
                    state.minutes_left = self.config.short_break_duration;
                }
            }
        }
        state.seconds_left = 0;

        self.play_alert();

        let at = Utc::now();
        if self.is_finished() {
            tracing::info!(rounds = self.config.rounds, "pomodoro session finished");
            return Some(Event::SessionFinished {
                rounds: self.config.rounds,
                at,
            });
        }

        tracing::info!(
            from = from.name(),
            to = self.state.phase.name(),
            round = self.state.current_round,
            skipped,
            "phase completed"
        );
        // A skip while paused stays paused.
        if self.auto_continue && was_running {
            self.state.is_running = true;
        }
        Some(Event::PhaseCompleted {
            from,
            to: self.state.phase,
            current_round: self.state.current_round,
            skipped,
            at,
        })
    }

    fn play_alert(&self) {
        let effect = self.config.sound_effect;
        if let Err(err) = self.sound.play(effect, self.config.sound_effect_volume) {
            tracing::debug!(sound = %effect, error = %err, "alert sound failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::sound::{SoundEffect, SoundError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPlayer {
        played: Mutex<Vec<(SoundEffect, f64)>>,
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&self, effect: SoundEffect, volume: f64) -> Result<(), SoundError> {
            self.played.lock().unwrap().push((effect, volume));
            Ok(())
        }
    }

    struct BrokenPlayer;

    impl SoundPlayer for BrokenPlayer {
        fn play(&self, _effect: SoundEffect, _volume: f64) -> Result<(), SoundError> {
            Err(SoundError::Unavailable("no audio device".into()))
        }
    }

    fn config() -> PomodoroConfig {
        PomodoroConfig {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            rounds: 4,
            sound_effect: SoundEffect::Digital,
            sound_effect_volume: 0.8,
        }
    }

    fn run_out(engine: &mut PomodoroEngine) -> Option<Event> {
        engine.start();
        let mut last = None;
        while engine.is_running() {
            last = engine.tick();
        }
        last
    }

    #[test]
    fn initial_state() {
        let engine = PomodoroEngine::silent(config()).unwrap();
        let state = engine.state();
        assert_eq!(state.minutes_left, 25);
        assert_eq!(state.seconds_left, 0);
        assert!(!state.is_running);
        assert!(!state.is_break());
        assert_eq!(state.current_round, 1);
        assert_eq!(state.completed_work_phases_in_cycle, 1);
        assert_eq!(engine.session_state(), SessionState::Work { round: 1 });
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let cfg = PomodoroConfig {
            work_duration: 0,
            ..config()
        };
        assert!(PomodoroEngine::silent(cfg).is_err());
    }

    #[test]
    fn start_pause() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        assert!(engine.start().is_some());
        assert!(engine.is_running());
        assert!(engine.start().is_none());

        assert!(engine.pause().is_some());
        assert!(!engine.is_running());
        assert!(engine.pause().is_none());
    }

    #[test]
    fn tick_borrows_a_minute() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().minutes_left, 24);
        assert_eq!(engine.state().seconds_left, 59);
        engine.tick();
        assert_eq!(engine.state().seconds_left, 58);
    }

    #[test]
    fn tick_while_paused_is_noop() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        for _ in 0..10 {
            engine.tick();
        }
        engine.pause();
        let frozen = engine.state().clone();
        for _ in 0..100 {
            assert!(engine.tick().is_none());
        }
        assert_eq!(engine.state(), &frozen);
    }

    #[test]
    fn boundary_reached_on_the_zero_tick() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        for _ in 0..(25 * 60 - 1) {
            assert!(engine.tick().is_none());
        }
        assert_eq!(engine.state().remaining_secs(), 1);
        let event = engine.tick();
        assert!(matches!(
            event,
            Some(Event::PhaseCompleted { from: Phase::Work, to: Phase::ShortBreak, skipped: false, .. })
        ));
        assert_eq!(engine.state().minutes_left, 5);
        assert_eq!(engine.state().seconds_left, 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn skip_right_after_start_goes_to_short_break() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        let event = engine.skip();
        assert!(matches!(event, Some(Event::PhaseCompleted { skipped: true, .. })));
        let snap = engine.snapshot();
        assert_eq!(snap.state, SessionState::ShortBreak);
        assert_eq!(snap.clock(), "05:00");
        assert!(!snap.is_running);
    }

    #[test]
    fn full_session_walks_the_expected_phases() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        let mut seen = vec![engine.session_state()];
        while !engine.is_finished() {
            run_out(&mut engine);
            seen.push(engine.session_state());
        }
        assert_eq!(
            seen,
            vec![
                SessionState::Work { round: 1 },
                SessionState::ShortBreak,
                SessionState::Work { round: 2 },
                SessionState::ShortBreak,
                SessionState::Work { round: 3 },
                SessionState::ShortBreak,
                SessionState::Work { round: 4 },
                SessionState::LongBreak,
                SessionState::Finished,
            ]
        );
        assert_eq!(engine.state().current_round, 5);
    }

    #[test]
    fn finished_session_rejects_start_and_skip() {
        let mut engine = PomodoroEngine::silent(PomodoroConfig {
            rounds: 1,
            ..config()
        })
        .unwrap();
        engine.skip();
        let last = engine.skip();
        assert!(matches!(last, Some(Event::SessionFinished { rounds: 1, .. })));
        assert!(engine.is_finished());
        assert!(engine.start().is_none());
        assert!(engine.skip().is_none());
        assert!(engine.tick().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn reset_returns_initial_state() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        let initial = engine.state().clone();
        engine.start();
        engine.skip();
        engine.skip();
        engine.start();
        engine.tick();
        assert!(matches!(engine.reset(), Some(Event::TimerReset { .. })));
        assert_eq!(engine.state(), &initial);
    }

    #[test]
    fn long_break_progress_uses_long_duration() {
        let mut engine = PomodoroEngine::silent(PomodoroConfig {
            long_break_interval: 1,
            ..config()
        })
        .unwrap();
        engine.skip();
        assert_eq!(engine.session_state(), SessionState::LongBreak);
        assert_eq!(engine.phase_total_secs(), 15 * 60);
        assert_eq!(engine.progress_fraction(), 0.0);
        engine.start();
        for _ in 0..(15 * 30) {
            engine.tick();
        }
        assert!((engine.progress_fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn interval_of_one_makes_every_break_long() {
        let mut engine = PomodoroEngine::silent(PomodoroConfig {
            long_break_interval: 1,
            rounds: 3,
            ..config()
        })
        .unwrap();
        for _ in 0..3 {
            engine.skip();
            assert_eq!(engine.session_state(), SessionState::LongBreak);
            assert_eq!(engine.state().completed_work_phases_in_cycle, 1);
            engine.skip();
        }
        assert!(engine.is_finished());
    }

    #[test]
    fn auto_continue_keeps_running_until_finished() {
        let mut engine = PomodoroEngine::silent(PomodoroConfig {
            rounds: 1,
            ..config()
        })
        .unwrap()
        .with_auto_continue(true);
        engine.start();
        engine.skip();
        assert_eq!(engine.session_state(), SessionState::ShortBreak);
        assert!(engine.is_running());
        engine.skip();
        assert!(engine.is_finished());
        assert!(!engine.is_running());
    }

    #[test]
    fn paused_skip_with_auto_continue_stays_paused() {
        let mut engine = PomodoroEngine::silent(config()).unwrap().with_auto_continue(true);
        engine.skip();
        assert_eq!(engine.session_state(), SessionState::ShortBreak);
        assert!(!engine.is_running());

        engine.start();
        engine.pause();
        engine.skip();
        assert_eq!(engine.session_state(), SessionState::Work { round: 2 });
        assert!(!engine.is_running());
        assert!(engine.start().is_some());
    }

    #[test]
    fn complete_phase_is_an_unskipped_boundary() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        engine.tick();
        let event = engine.complete_phase();
        assert!(matches!(
            event,
            Some(Event::PhaseCompleted { from: Phase::Work, to: Phase::ShortBreak, skipped: false, .. })
        ));
        assert_eq!(engine.snapshot().clock(), "05:00");
        assert!(!engine.is_running());
    }

    #[test]
    fn alert_played_on_every_boundary() {
        let player = Arc::new(RecordingPlayer::default());
        let mut engine = PomodoroEngine::new(config(), player.clone()).unwrap();
        engine.skip();
        engine.skip();
        let played = player.played.lock().unwrap();
        assert_eq!(played.as_slice(), &[(SoundEffect::Digital, 0.8), (SoundEffect::Digital, 0.8)]);
    }

    #[test]
    fn broken_player_does_not_stop_transition() {
        let mut engine = PomodoroEngine::new(config(), Arc::new(BrokenPlayer)).unwrap();
        assert!(engine.skip().is_some());
        assert_eq!(engine.session_state(), SessionState::ShortBreak);
    }

    #[test]
    fn snapshot_renders_display_fields() {
        let mut engine = PomodoroEngine::silent(config()).unwrap();
        engine.start();
        engine.tick();
        let snap = engine.snapshot();
        assert_eq!(snap.clock(), "24:59");
        assert_eq!(snap.phase.label(), "Focus");
        assert_eq!(snap.round_label(), "round 1 of 4");
        assert!(snap.progress_fraction > 0.0 && snap.progress_fraction < 0.01);
    }
}
