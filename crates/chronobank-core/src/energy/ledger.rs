//! Append-only energy transaction ledger.
//!
//! The raw ledger is never clamped: the running balance may go negative
//! or exceed the maximum so that audits and tests see true deltas.
//! Clamping to `[0, max_energy]` happens only in the derived
//! [`MentalBankState`] display view.

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::energy::policy::EnergyPolicy;
use crate::events::Event;
use crate::stats::week_start;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    TaskStart,
    TaskComplete,
    TaskMove,
    FocusSession,
    Break,
    Sleep,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::TaskStart => "task_start",
            TransactionType::TaskComplete => "task_complete",
            TransactionType::TaskMove => "task_move",
            TransactionType::FocusSession => "focus_session",
            TransactionType::Break => "break",
            TransactionType::Sleep => "sleep",
        }
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyTransaction {
    pub id: Uuid,
    #[serde(default)]
    pub task_id: Option<String>,
    pub transaction_type: TransactionType,
    pub energy_delta: i64,
    pub timestamp: DateTime<Utc>,
    /// Free-form display metadata.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Rolling weekly statistics, derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub energy_spent: i64,
    pub energy_gained: i64,
    pub tasks_completed: u64,
    pub focus_minutes: u64,
}

/// Display view over the ledger. Recomputed, never persisted separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentalBankState {
    /// Balance clamped to `[0, max_energy]` for display.
    pub current_energy: i64,
    pub max_energy: i64,
    /// Energy spent (negative deltas) since local midnight.
    pub daily_expenditure: i64,
    pub streak_days: u64,
    pub total_tasks_completed: u64,
    pub weekly: WeeklyStats,
}

/// Append-only log of signed energy deltas. Single-writer by design: the
/// current process is the only author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyLedger {
    pub initial_energy: i64,
    pub max_energy: i64,
    transactions: Vec<EnergyTransaction>,
}

impl EnergyLedger {
    pub fn new(initial_energy: i64, max_energy: i64) -> Self {
        Self {
            initial_energy,
            max_energy,
            transactions: Vec::new(),
        }
    }

    pub fn transactions(&self) -> &[EnergyTransaction] {
        &self.transactions
    }

    /// Append a transaction. Never rejects based on the resulting balance.
    pub fn record(
        &mut self,
        transaction_type: TransactionType,
        energy_delta: i64,
        task_id: Option<String>,
        metadata: Option<Value>,
    ) -> &EnergyTransaction {
        self.record_at(transaction_type, energy_delta, task_id, metadata, Utc::now())
    }

    pub fn record_at(
        &mut self,
        transaction_type: TransactionType,
        energy_delta: i64,
        task_id: Option<String>,
        metadata: Option<Value>,
        timestamp: DateTime<Utc>,
    ) -> &EnergyTransaction {
        self.transactions.push(EnergyTransaction {
            id: Uuid::new_v4(),
            task_id,
            transaction_type,
            energy_delta,
            timestamp,
            metadata,
        });
        self.transactions.last().expect("just pushed")
    }

    /// Record the reward for a completed focus session.
    ///
    /// At most one transaction per completion; a zero reward (under 25
    /// minutes) or a sub-minute session records nothing, keeping the
    /// ledger free of zero-value noise.
    pub fn record_focus_completion(
        &mut self,
        policy: &EnergyPolicy,
        task_id: Option<String>,
        actual_minutes: u32,
        now: DateTime<Utc>,
    ) -> Option<EnergyTransaction> {
        if actual_minutes < 1 {
            return None;
        }
        let reward = policy.focus_session_reward(actual_minutes);
        if reward == 0 {
            return None;
        }
        let metadata = serde_json::json!({ "minutes": actual_minutes });
        Some(
            self.record_at(
                TransactionType::FocusSession,
                reward,
                task_id,
                Some(metadata),
                now,
            )
            .clone(),
        )
    }

    /// Observable event for a just-recorded transaction, carrying the
    /// resulting raw balance.
    pub fn recorded_event(&self, transaction: &EnergyTransaction) -> Event {
        Event::EnergyRecorded {
            transaction_type: transaction.transaction_type.as_str().to_string(),
            energy_delta: transaction.energy_delta,
            balance: self.current_balance(),
            at: transaction.timestamp,
        }
    }

    /// Raw running balance: initial plus the sum of all deltas. Unclamped.
    pub fn current_balance(&self) -> i64 {
        self.initial_energy + self.transactions.iter().map(|t| t.energy_delta).sum::<i64>()
    }

    /// Sum of spend (negative deltas, as positive magnitudes) at/after
    /// the given boundary.
    pub fn daily_expenditure_since(&self, boundary: DateTime<Utc>) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.timestamp >= boundary)
            .map(|t| (-t.energy_delta).max(0))
            .sum()
    }

    /// Derived display state.
    pub fn bank_state(&self, now: DateTime<Utc>) -> MentalBankState {
        let balance = self.current_balance();
        let current_energy = balance.clamp(0, self.max_energy);
        let daily_expenditure = self.daily_expenditure_since(local_midnight(now));

        let week_boundary = week_start(now);
        let mut weekly = WeeklyStats::default();
        let mut total_tasks_completed = 0;
        for t in &self.transactions {
            if t.transaction_type == TransactionType::TaskComplete {
                total_tasks_completed += 1;
            }
            if t.timestamp < week_boundary {
                continue;
            }
            if t.energy_delta < 0 {
                weekly.energy_spent += -t.energy_delta;
            } else {
                weekly.energy_gained += t.energy_delta;
            }
            match t.transaction_type {
                TransactionType::TaskComplete => weekly.tasks_completed += 1,
                TransactionType::FocusSession => {
                    if let Some(minutes) = t
                        .metadata
                        .as_ref()
                        .and_then(|m| m.get("minutes"))
                        .and_then(Value::as_u64)
                    {
                        weekly.focus_minutes += minutes;
                    }
                }
                _ => {}
            }
        }

        MentalBankState {
            current_energy,
            max_energy: self.max_energy,
            daily_expenditure,
            streak_days: self.streak_days(now),
            total_tasks_completed,
            weekly,
        }
    }

    /// Consecutive UTC days ending today with at least one transaction.
    fn streak_days(&self, now: DateTime<Utc>) -> u64 {
        let mut streak = 0u64;
        let mut day = now.date_naive();
        loop {
            let active = self.transactions.iter().any(|t| t.timestamp.date_naive() == day);
            if !active {
                break;
            }
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }
}

/// Local midnight preceding `now`, as a UTC instant. Falls back to UTC
/// midnight when the local offset is ambiguous (DST transitions).
pub fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_day = now.with_timezone(&Local).date_naive();
    let naive = local_day
        .and_hms_opt(0, 0, 0)
        .expect("00:00:00 is always valid");
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc
            .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
            .single()
            .unwrap_or(now),
    }
}
