use serde::{Deserialize, Serialize};

use super::config::PomodoroConfig;
use super::engine::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub phase: Phase,
    /// Work round this step belongs to (breaks carry the round they follow).
    pub round: u32,
    /// Duration in minutes.
    pub duration_min: u64,
    pub label: String,
}

impl Step {
    /// Get step duration in seconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(&self) -> u64 {
        self.duration_min.saturating_mul(60)
    }
}

/// The ordered phases a full session walks through, start to finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub steps: Vec<Step>,
}

impl Schedule {
    /// Lay out every phase of a session under `config`, using the same
    /// cycle rules as the engine.
    pub fn plan(config: &PomodoroConfig) -> Self {
        let interval = config.long_break_interval.max(1);
        let mut steps = Vec::new();
        let mut cycle = 1;

        for round in 1..=config.rounds {
            steps.push(Step {
                phase: Phase::Work,
                round,
                duration_min: u64::from(config.work_duration),
                label: format!("Focus {round}"),
            });

            let (phase, duration) = if cycle >= interval {
                cycle = 1;
                (Phase::LongBreak, config.long_break_duration)
            } else {
                cycle += 1;
                (Phase::ShortBreak, config.short_break_duration)
            };
            steps.push(Step {
                phase,
                round,
                duration_min: u64::from(duration),
                label: phase.name().to_string(),
            });
        }

        Self { steps }
    }

    pub fn total_duration_min(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_min).sum()
    }

    pub fn focus_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.phase == Phase::Work)
            .count()
    }

    pub fn long_break_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.phase == Phase::LongBreak)
            .count()
    }
}
