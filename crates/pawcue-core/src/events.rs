use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::PhaseKind;

/// Every reminder state change produces an Event.
/// The CLI prints them; the driver broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RunStarted {
        behavior_count: u32,
        phase_count: usize,
        total_secs: u64,
        first_phase: PhaseKind,
        first_phase_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase after the first one became active.
    PhaseStarted {
        schedule_index: usize,
        kind: PhaseKind,
        /// 1-based ordinal of the current (or last finished) behavior.
        behavior_index: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    RunPaused {
        phase_remaining_ms: u64,
        total_remaining_ms: u64,
        at: DateTime<Utc>,
    },
    RunResumed {
        phase_remaining_ms: u64,
        total_remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// The schedule ran out.
    RunCompleted {
        behavior_count: u32,
        at: DateTime<Utc>,
    },
    /// The caller stopped the run early.
    RunStopped {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether the run this event belongs to is over.
    pub fn ends_run(&self) -> bool {
        matches!(self, Event::RunCompleted { .. } | Event::RunStopped { .. })
    }
}
