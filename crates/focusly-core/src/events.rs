use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every discrete change made by the engine produces an Event.
/// Plain countdown ticks do not; display surfaces follow the snapshot
/// stream for those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        current_round: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A phase ended, either by running out or by a skip.
    PhaseCompleted {
        from: Phase,
        to: Phase,
        current_round: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// The last break ended and `current_round` moved past `rounds`.
    SessionFinished {
        rounds: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
}
