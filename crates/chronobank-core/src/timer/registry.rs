//! Multi-timer registry: the set of concurrently active per-task timers.
//!
//! The registry owns the durable snapshot exclusively. Every mutation
//! serializes the whole timer map as one JSON blob through the
//! [`DurableStore`]; a failed write degrades to a warning (in-memory state
//! stays authoritative for the process) rather than failing the operation.
//!
//! `restore()` runs once at process start. Entries older than the
//! staleness window are discarded, never resumed; a single corrupt entry
//! is dropped without aborting the rest of the snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::{Result, TimerError};
use crate::events::{Event, TimerSummary};
use crate::storage::DurableStore;
use crate::timer::session::{
    DurationPresets, SessionKind, SessionOutcome, SessionState, TaskSnapshot, TimerSession,
};

/// Store key for the serialized timer map.
const SNAPSHOT_KEY: &str = "timers";

/// A persisted-but-unfinished timer older than this is discarded on
/// restore rather than resumed.
pub const STALENESS_WINDOW_HOURS: i64 = 24;

/// A finalized session handed back from [`MultiTimerRegistry::stop_timer`].
///
/// The registry is a pure coordination point: the caller forwards this to
/// the session database and the energy ledger.
#[derive(Debug, Clone)]
pub struct StoppedTimer {
    pub session: TimerSession,
    pub outcome: SessionOutcome,
    pub event: Event,
}

/// Holds all active timers, keyed by task id (or a synthetic key for
/// task-less focus/break sessions). At most one non-completed session per
/// key.
pub struct MultiTimerRegistry {
    timers: HashMap<String, TimerSession>,
    store: Box<dyn DurableStore>,
    presets: DurationPresets,
    /// Soft failures (snapshot write errors) accumulated since the last
    /// call to [`take_warnings`](Self::take_warnings).
    warnings: Vec<Event>,
}

impl MultiTimerRegistry {
    pub fn new(store: Box<dyn DurableStore>, presets: DurationPresets) -> Self {
        Self {
            timers: HashMap::new(),
            store,
            presets,
            warnings: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&TimerSession> {
        self.timers.get(key)
    }

    /// Live view of every timer for status displays. Read-only: the
    /// display tick must never mutate `elapsed_secs`.
    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<TimerSummary> {
        let mut out: Vec<TimerSummary> = self
            .timers
            .iter()
            .map(|(key, s)| TimerSummary {
                task_id: key.clone(),
                kind: s.kind,
                state: s.state,
                live_elapsed_secs: s.live_elapsed_secs(now),
                planned_duration_min: s.planned_duration_min,
            })
            .collect();
        out.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        out
    }

    pub fn snapshot_event(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            timers: self.summaries(now),
            at: now,
        }
    }

    /// Drain soft failures accumulated by persistence writes.
    pub fn take_warnings(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.warnings)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a timer for `key`. Fails with `Conflict` if a non-completed
    /// session already exists for that key.
    pub fn start_timer(
        &mut self,
        key: &str,
        kind: SessionKind,
        metadata: Option<TaskSnapshot>,
    ) -> Result<Event> {
        self.start_timer_at(key, kind, metadata, Utc::now())
    }

    pub fn start_timer_at(
        &mut self,
        key: &str,
        kind: SessionKind,
        metadata: Option<TaskSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<Event> {
        if self.timers.contains_key(key) {
            return Err(TimerError::Conflict {
                task_id: key.to_string(),
            }
            .into());
        }
        let session =
            TimerSession::start_at(kind, Some(key.to_string()), &self.presets, metadata, now);
        let event = Event::TimerStarted {
            task_id: key.to_string(),
            kind,
            planned_duration_min: session.planned_duration_min,
            at: now,
        };
        self.timers.insert(key.to_string(), session);
        self.persist();
        Ok(event)
    }

    /// Pause the timer for `key`.
    ///
    /// Returns `Ok(None)` when the session is already paused: idempotent
    /// UI actions are a warning, not a failure.
    pub fn pause_timer(&mut self, key: &str) -> Result<Option<Event>> {
        self.pause_timer_at(key, Utc::now())
    }

    pub fn pause_timer_at(&mut self, key: &str, now: DateTime<Utc>) -> Result<Option<Event>> {
        let session = self.timers.get_mut(key).ok_or_else(|| TimerError::NotFound {
            task_id: key.to_string(),
        })?;
        match session.pause_at(now) {
            Ok(()) => {
                let event = Event::TimerPaused {
                    task_id: key.to_string(),
                    elapsed_secs: session.elapsed_secs,
                    at: now,
                };
                self.persist();
                Ok(Some(event))
            }
            Err(e) => {
                tracing::warn!(task_id = key, "ignoring pause: {e}");
                Ok(None)
            }
        }
    }

    /// Resume the timer for `key`. `Ok(None)` when already running.
    pub fn resume_timer(&mut self, key: &str) -> Result<Option<Event>> {
        self.resume_timer_at(key, Utc::now())
    }

    pub fn resume_timer_at(&mut self, key: &str, now: DateTime<Utc>) -> Result<Option<Event>> {
        let session = self.timers.get_mut(key).ok_or_else(|| TimerError::NotFound {
            task_id: key.to_string(),
        })?;
        match session.resume_at(now) {
            Ok(()) => {
                let event = Event::TimerResumed {
                    task_id: key.to_string(),
                    elapsed_secs: session.elapsed_secs,
                    at: now,
                };
                self.persist();
                Ok(Some(event))
            }
            Err(e) => {
                tracing::warn!(task_id = key, "ignoring resume: {e}");
                Ok(None)
            }
        }
    }

    /// Stop and finalize the timer for `key`, removing it from the
    /// registry. The caller hands the result to the session database and
    /// the energy ledger; the registry itself never touches the network.
    pub fn stop_timer(
        &mut self,
        key: &str,
        actual_minutes_override: Option<u32>,
    ) -> Result<StoppedTimer> {
        self.stop_timer_at(key, actual_minutes_override, Utc::now())
    }

    pub fn stop_timer_at(
        &mut self,
        key: &str,
        actual_minutes_override: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<StoppedTimer> {
        let mut session = self.timers.remove(key).ok_or_else(|| TimerError::NotFound {
            task_id: key.to_string(),
        })?;
        let outcome = match session.complete_at(actual_minutes_override, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                // Unreachable in practice: completed sessions never stay
                // in the map. Reinsert untouched and surface the error.
                self.timers.insert(key.to_string(), session);
                return Err(e.into());
            }
        };
        let event = Event::TimerStopped {
            task_id: key.to_string(),
            elapsed_secs: outcome.elapsed_secs,
            actual_minutes: outcome.actual_minutes,
            achievements: outcome.achievements.clone(),
            at: now,
        };
        self.persist();
        Ok(StoppedTimer {
            session,
            outcome,
            event,
        })
    }

    /// Load the durable snapshot, pruning stale and corrupt entries.
    ///
    /// Call once at process start. Idempotent: restoring the same snapshot
    /// twice yields identical registry contents.
    pub fn restore(&mut self) -> Vec<Event> {
        self.restore_at(Utc::now())
    }

    pub fn restore_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let bytes = match self.store.get(SNAPSHOT_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("snapshot read failed, starting empty: {e}");
                return Vec::new();
            }
        };

        // Parse the outer map loosely so one malformed entry never
        // prevents the rest of the snapshot from loading.
        let raw: HashMap<String, Value> = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("snapshot unparsable, starting empty: {e}");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let mut restored = HashMap::new();
        let cutoff = now - Duration::hours(STALENESS_WINDOW_HOURS);

        for (key, value) in raw {
            let session: TimerSession = match serde_json::from_value(value) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(task_id = %key, "dropping corrupt snapshot entry: {e}");
                    events.push(Event::SessionDiscarded {
                        task_id: key,
                        reason: "corrupt".to_string(),
                        at: now,
                    });
                    continue;
                }
            };
            if session.started_at < cutoff {
                events.push(Event::SessionDiscarded {
                    task_id: key,
                    reason: "stale".to_string(),
                    at: now,
                });
                continue;
            }
            if session.state == SessionState::Completed {
                // Completed sessions are handed off at stop time and never
                // belong in the snapshot.
                events.push(Event::SessionDiscarded {
                    task_id: key,
                    reason: "completed".to_string(),
                    at: now,
                });
                continue;
            }
            // Running sessions keep their persisted elapsed_secs untouched;
            // the in-progress segment is recomputed on every read from
            // started_at, so no time is lost or double-counted.
            events.push(Event::SessionRestored {
                task_id: key.clone(),
                state: session.state,
                at: now,
            });
            restored.insert(key, session);
        }

        self.timers = restored;
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Write the whole timer map to the durable store. Write failures are
    /// non-fatal: warn, record an event, keep the in-memory state.
    fn persist(&mut self) {
        let bytes = match serde_json::to_vec(&self.timers) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("snapshot serialization failed: {e}");
                self.warnings.push(Event::SnapshotWriteFailed {
                    message: e.to_string(),
                    at: Utc::now(),
                });
                return;
            }
        };
        if let Err(e) = self.store.set(SNAPSHOT_KEY, &bytes) {
            tracing::warn!("snapshot write failed: {e}");
            self.warnings.push(Event::SnapshotWriteFailed {
                message: e.to_string(),
                at: Utc::now(),
            });
        }
    }
}
