//! Per-task timer session state machine.
//!
//! A session is a wall-clock-based state machine with no internal thread.
//! `elapsed_secs` only ever holds *completed* running segments; the current
//! in-progress segment is computed on read from `started_at`, so frequent
//! display ticks never mutate (or round-drift) the persisted field.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> (Paused -> Running)* -> Completed
//! ```
//!
//! No transition leaves `Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::energy::Priority;
use crate::error::TimerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Focus,
    Break,
    LongBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Paused,
    Completed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
        }
    }
}

/// Planned durations per session kind, in minutes.
///
/// A UI hint only -- focus sessions may run indefinitely; nothing here is
/// enforced by the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationPresets {
    #[serde(default = "default_focus_min")]
    pub focus_min: u32,
    #[serde(default = "default_short_break_min")]
    pub short_break_min: u32,
    #[serde(default = "default_long_break_min")]
    pub long_break_min: u32,
}

fn default_focus_min() -> u32 {
    25
}
fn default_short_break_min() -> u32 {
    5
}
fn default_long_break_min() -> u32 {
    15
}

impl Default for DurationPresets {
    fn default() -> Self {
        Self {
            focus_min: default_focus_min(),
            short_break_min: default_short_break_min(),
            long_break_min: default_long_break_min(),
        }
    }
}

impl DurationPresets {
    pub fn for_kind(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus_min,
            SessionKind::Break => self.short_break_min,
            SessionKind::LongBreak => self.long_break_min,
        }
    }
}

/// Task attributes captured when the timer starts.
///
/// Decouples the running session from later task edits: the rate and
/// priority billed are the ones in effect at start time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub task_priority: Option<Priority>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of completing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Final elapsed seconds with the last running segment folded in.
    pub elapsed_secs: u64,
    /// Override if provided, otherwise elapsed rounded to the nearest minute.
    pub actual_minutes: u32,
    /// Cosmetic achievement strings. No side effects.
    pub achievements: Vec<String>,
}

/// One concurrently-running timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: Uuid,
    #[serde(default)]
    pub task_id: Option<String>,
    pub kind: SessionKind,
    pub planned_duration_min: u32,
    /// When the current running segment began (or the last one, if paused).
    pub started_at: DateTime<Utc>,
    /// Completed running segments only. Monotonically non-decreasing.
    pub elapsed_secs: u64,
    pub state: SessionState,
    #[serde(default)]
    pub metadata: Option<TaskSnapshot>,
}

impl TimerSession {
    /// Create a new running session starting now.
    pub fn start(
        kind: SessionKind,
        task_id: Option<String>,
        presets: &DurationPresets,
        metadata: Option<TaskSnapshot>,
    ) -> Self {
        Self::start_at(kind, task_id, presets, metadata, Utc::now())
    }

    pub fn start_at(
        kind: SessionKind,
        task_id: Option<String>,
        presets: &DurationPresets,
        metadata: Option<TaskSnapshot>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            kind,
            planned_duration_min: presets.for_kind(kind),
            started_at: now,
            elapsed_secs: 0,
            state: SessionState::Running,
            metadata,
        }
    }

    /// Elapsed time including the in-progress running segment.
    ///
    /// This is the only correct read path for display ticks: the persisted
    /// `elapsed_secs` stays untouched until a fold on pause/complete.
    pub fn live_elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            SessionState::Running => {
                let segment = now.signed_duration_since(self.started_at).num_seconds();
                self.elapsed_secs + segment.max(0) as u64
            }
            SessionState::Paused | SessionState::Completed => self.elapsed_secs,
        }
    }

    /// Fold the in-progress segment and pause. Valid only from `Running`.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        self.pause_at(Utc::now())
    }

    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            SessionState::Running => {
                self.fold_segment(now);
                self.state = SessionState::Paused;
                Ok(())
            }
            _ => Err(TimerError::InvalidState {
                action: "pause",
                state: self.state.as_str(),
            }),
        }
    }

    /// Begin a new running segment. Valid only from `Paused`.
    pub fn resume(&mut self) -> Result<(), TimerError> {
        self.resume_at(Utc::now())
    }

    pub fn resume_at(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            SessionState::Paused => {
                self.started_at = now;
                self.state = SessionState::Running;
                Ok(())
            }
            _ => Err(TimerError::InvalidState {
                action: "resume",
                state: self.state.as_str(),
            }),
        }
    }

    /// Finalize the session. Valid from `Running` or `Paused`.
    ///
    /// `actual_minutes_override` replaces the derived minute count without
    /// touching `elapsed_secs`.
    pub fn complete(
        &mut self,
        actual_minutes_override: Option<u32>,
    ) -> Result<SessionOutcome, TimerError> {
        self.complete_at(actual_minutes_override, Utc::now())
    }

    pub fn complete_at(
        &mut self,
        actual_minutes_override: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, TimerError> {
        match self.state {
            SessionState::Running => self.fold_segment(now),
            SessionState::Paused => {}
            SessionState::Completed => {
                return Err(TimerError::InvalidState {
                    action: "complete",
                    state: self.state.as_str(),
                })
            }
        }
        self.state = SessionState::Completed;

        let derived_minutes = ((self.elapsed_secs + 30) / 60) as u32;
        let actual_minutes = actual_minutes_override.unwrap_or(derived_minutes);

        Ok(SessionOutcome {
            elapsed_secs: self.elapsed_secs,
            actual_minutes,
            achievements: self.achievements(actual_minutes),
        })
    }

    fn achievements(&self, actual_minutes: u32) -> Vec<String> {
        let mut out = Vec::new();
        match self.kind {
            SessionKind::Focus => {
                if actual_minutes >= 25 {
                    out.push("Completed a full 25-minute focus session".to_string());
                }
                if actual_minutes >= 45 {
                    out.push("Deep work: 45+ minutes of sustained focus".to_string());
                }
            }
            SessionKind::Break | SessionKind::LongBreak => {
                out.push("Took a proper break".to_string());
            }
        }
        out
    }

    fn fold_segment(&mut self, now: DateTime<Utc>) {
        let segment = now.signed_duration_since(self.started_at).num_seconds();
        self.elapsed_secs += segment.max(0) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2026-03-02T09:00:00Z".parse().unwrap()
    }

    fn focus_at(now: DateTime<Utc>) -> TimerSession {
        TimerSession::start_at(
            SessionKind::Focus,
            Some("task-1".into()),
            &DurationPresets::default(),
            None,
            now,
        )
    }

    #[test]
    fn pause_resume_fold() {
        let start = t0();
        let mut s = focus_at(start);

        // Pause at +10s: one folded segment.
        s.pause_at(start + Duration::seconds(10)).unwrap();
        assert_eq!(s.elapsed_secs, 10);

        // Resume at +60s, complete at +70s: second segment is 10s.
        s.resume_at(start + Duration::seconds(60)).unwrap();
        let out = s
            .complete_at(None, start + Duration::seconds(70))
            .unwrap();
        assert_eq!(out.elapsed_secs, 20);
        assert_eq!(s.state, SessionState::Completed);
    }

    #[test]
    fn live_elapsed_does_not_mutate() {
        let start = t0();
        let s = focus_at(start);
        assert_eq!(s.live_elapsed_secs(start + Duration::seconds(90)), 90);
        assert_eq!(s.elapsed_secs, 0);
    }

    #[test]
    fn live_elapsed_while_paused_is_frozen() {
        let start = t0();
        let mut s = focus_at(start);
        s.pause_at(start + Duration::seconds(30)).unwrap();
        assert_eq!(s.live_elapsed_secs(start + Duration::seconds(500)), 30);
    }

    #[test]
    fn invalid_transitions() {
        let start = t0();
        let mut s = focus_at(start);
        assert!(matches!(
            s.resume_at(start),
            Err(TimerError::InvalidState { action: "resume", .. })
        ));
        s.pause_at(start + Duration::seconds(5)).unwrap();
        assert!(matches!(
            s.pause_at(start + Duration::seconds(6)),
            Err(TimerError::InvalidState { action: "pause", .. })
        ));
        s.complete_at(None, start + Duration::seconds(7)).unwrap();
        assert!(s.complete_at(None, start + Duration::seconds(8)).is_err());
    }

    #[test]
    fn complete_rounds_to_nearest_minute() {
        let start = t0();
        let mut s = focus_at(start);
        // 149s rounds down to 2 min, 150s would round up.
        let out = s.complete_at(None, start + Duration::seconds(149)).unwrap();
        assert_eq!(out.actual_minutes, 2);

        let mut s = focus_at(start);
        let out = s.complete_at(None, start + Duration::seconds(150)).unwrap();
        assert_eq!(out.actual_minutes, 3);
    }

    #[test]
    fn override_replaces_derived_minutes() {
        let start = t0();
        let mut s = focus_at(start);
        let out = s
            .complete_at(Some(50), start + Duration::seconds(60))
            .unwrap();
        assert_eq!(out.actual_minutes, 50);
        assert_eq!(out.elapsed_secs, 60);
    }

    #[test]
    fn focus_achievements_thresholds() {
        let start = t0();
        let mut s = focus_at(start);
        let out = s.complete_at(Some(24), start).unwrap();
        assert!(out.achievements.is_empty());

        let mut s = focus_at(start);
        let out = s.complete_at(Some(25), start).unwrap();
        assert_eq!(out.achievements.len(), 1);

        let mut s = focus_at(start);
        let out = s.complete_at(Some(45), start).unwrap();
        assert_eq!(out.achievements.len(), 2);
    }

    #[test]
    fn any_completed_break_earns_achievement() {
        let start = t0();
        let mut s = TimerSession::start_at(
            SessionKind::Break,
            None,
            &DurationPresets::default(),
            None,
            start,
        );
        let out = s.complete_at(None, start + Duration::seconds(60)).unwrap();
        assert_eq!(out.achievements.len(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any alternation of running/paused intervals folds to exactly
            /// the sum of the running intervals.
            #[test]
            fn fold_sums_running_segments(segments in proptest::collection::vec((1u32..600, 1u32..600), 1..8)) {
                let start = t0();
                let mut s = focus_at(start);
                let mut now = start;
                let mut expected = 0u64;

                for (run_secs, pause_secs) in &segments {
                    now += Duration::seconds(*run_secs as i64);
                    expected += *run_secs as u64;
                    s.pause_at(now).unwrap();
                    now += Duration::seconds(*pause_secs as i64);
                    s.resume_at(now).unwrap();
                }

                let out = s.complete_at(None, now).unwrap();
                prop_assert_eq!(out.elapsed_secs, expected);
            }
        }
    }
}
