//! Property tests for the pomodoro state machine.
//!
//! Random configurations and random sequences of user actions and ticks,
//! checked against the invariants of the countdown and the cycle.

use focusly_core::{Phase, PomodoroConfig, PomodoroEngine, SessionState};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Start,
    Pause,
    Ticks(u32),
    Skip,
    Reset,
}

fn config_strategy() -> impl Strategy<Value = PomodoroConfig> {
    (1u32..=30, 1u32..=10, 1u32..=20, 1u32..=6, 1u32..=8).prop_map(
        |(work, short, long, interval, rounds)| PomodoroConfig {
            work_duration: work,
            short_break_duration: short,
            long_break_duration: long,
            long_break_interval: interval,
            rounds,
            ..PomodoroConfig::default()
        },
    )
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Start),
        1 => Just(Action::Pause),
        4 => (1u32..=200).prop_map(Action::Ticks),
        2 => Just(Action::Skip),
        1 => Just(Action::Reset),
    ]
}

fn apply(engine: &mut PomodoroEngine, action: &Action) {
    match action {
        Action::Start => {
            engine.start();
        }
        Action::Pause => {
            engine.pause();
        }
        Action::Ticks(n) => {
            for _ in 0..*n {
                engine.tick();
            }
        }
        Action::Skip => {
            engine.skip();
        }
        Action::Reset => {
            engine.reset();
        }
    }
}

fn check_invariants(engine: &PomodoroEngine) -> Result<(), TestCaseError> {
    let cfg = engine.config();
    let state = engine.state();
    prop_assert!(state.seconds_left <= 59);
    prop_assert!(state.completed_work_phases_in_cycle >= 1);
    prop_assert!(state.completed_work_phases_in_cycle <= cfg.long_break_interval);
    prop_assert!(state.current_round >= 1);
    prop_assert!(state.current_round <= cfg.rounds + 1);
    if state.is_running {
        prop_assert!(state.current_round <= cfg.rounds);
    }
    prop_assert_eq!(
        engine.session_state() == SessionState::Finished,
        state.current_round > cfg.rounds
    );
    let progress = engine.progress_fraction();
    prop_assert!((0.0..=1.0).contains(&progress));
    Ok(())
}

proptest! {
    #[test]
    fn work_phase_ends_after_exactly_its_length(cfg in config_strategy()) {
        let mut engine = PomodoroEngine::silent(cfg.clone()).unwrap();
        engine.start();
        let total = cfg.work_duration * 60;
        for _ in 0..total - 1 {
            engine.tick();
            prop_assert!(!engine.state().is_break());
        }
        engine.tick();
        prop_assert!(engine.state().is_break());
        let expected = if cfg.long_break_interval == 1 { Phase::LongBreak } else { Phase::ShortBreak };
        prop_assert_eq!(engine.state().phase, expected);
    }

    #[test]
    fn invariants_hold_under_random_actions(
        cfg in config_strategy(),
        actions in prop::collection::vec(action_strategy(), 1..60),
    ) {
        let mut engine = PomodoroEngine::silent(cfg).unwrap();
        check_invariants(&engine)?;
        for action in &actions {
            apply(&mut engine, action);
            check_invariants(&engine)?;
        }
    }

    #[test]
    fn long_break_follows_every_interval_th_work_phase(cfg in config_strategy()) {
        let mut engine = PomodoroEngine::silent(cfg.clone()).unwrap();
        let mut completed_work = 0u32;
        while !engine.is_finished() {
            let was_work = !engine.state().is_break();
            engine.skip();
            if was_work {
                completed_work += 1;
                let expected = if completed_work % cfg.long_break_interval == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                prop_assert_eq!(engine.state().phase, expected);
            }
        }
        prop_assert_eq!(completed_work, cfg.rounds);
    }

    #[test]
    fn finishes_exactly_after_last_round(cfg in config_strategy()) {
        let mut engine = PomodoroEngine::silent(cfg.clone()).unwrap();
        // Each round is one work phase plus one break.
        for _ in 0..(cfg.rounds * 2 - 1) {
            engine.skip();
            prop_assert!(!engine.is_finished());
        }
        engine.skip();
        prop_assert!(engine.is_finished());
        prop_assert_eq!(engine.state().current_round, cfg.rounds + 1);
    }

    #[test]
    fn paused_clock_never_moves(
        cfg in config_strategy(),
        before in 0u32..500,
        after in 1u32..500,
    ) {
        let mut engine = PomodoroEngine::silent(cfg).unwrap();
        engine.start();
        for _ in 0..before {
            engine.tick();
        }
        engine.pause();
        let frozen = engine.state().clone();
        for _ in 0..after {
            engine.tick();
        }
        prop_assert_eq!(engine.state(), &frozen);
    }

    #[test]
    fn reset_from_anywhere_is_fresh(
        cfg in config_strategy(),
        actions in prop::collection::vec(action_strategy(), 0..40),
    ) {
        let fresh = PomodoroEngine::silent(cfg.clone()).unwrap();
        let mut engine = PomodoroEngine::silent(cfg).unwrap();
        for action in &actions {
            apply(&mut engine, action);
        }
        engine.reset();
        prop_assert_eq!(engine.state(), fresh.state());
        prop_assert_eq!(engine.session_state(), SessionState::Work { round: 1 });
    }
}
