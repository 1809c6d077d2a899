use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionKind, SessionState};

/// Per-timer line in a [`Event::StateSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSummary {
    pub task_id: String,
    pub kind: SessionKind,
    pub state: SessionState,
    /// Live elapsed time including the current running segment.
    pub live_elapsed_secs: u64,
    pub planned_duration_min: u32,
}

/// Every state change in the system produces an Event.
/// The UI polls for events; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        task_id: String,
        kind: SessionKind,
        planned_duration_min: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        task_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        task_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        task_id: String,
        elapsed_secs: u64,
        actual_minutes: u32,
        achievements: Vec<String>,
        at: DateTime<Utc>,
    },
    /// A persisted session was brought back by `restore()`.
    SessionRestored {
        task_id: String,
        state: SessionState,
        at: DateTime<Utc>,
    },
    /// A persisted session was dropped during `restore()` (stale or unparsable).
    SessionDiscarded {
        task_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// The durable snapshot could not be written. Non-fatal: in-memory
    /// state remains authoritative for the rest of the process.
    SnapshotWriteFailed {
        message: String,
        at: DateTime<Utc>,
    },
    EnergyRecorded {
        transaction_type: String,
        energy_delta: i64,
        balance: i64,
        at: DateTime<Utc>,
    },
    /// Full registry snapshot for status displays.
    StateSnapshot {
        timers: Vec<TimerSummary>,
        at: DateTime<Utc>,
    },
}
