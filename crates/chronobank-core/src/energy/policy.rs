//! Energy policy: pure, deterministic functions from task and session
//! attributes to energy deltas.
//!
//! Everything here is driven by a caller-overridable configuration table
//! ([`EnergyPolicy`]); no state is held and nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority. Unknown values parse as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Lenient parse for values coming from external task records.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Medium,
        }
    }
}

/// Board column a task can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Todo,
    Doing,
    Done,
}

/// Task attributes the policy consumes, snapshotted from the external
/// task/category lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAttributes {
    pub id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

/// Per-priority value table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub urgent: f64,
}

impl PriorityTable {
    pub fn get(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Urgent => self.urgent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnModifiers {
    pub todo: f64,
    pub doing: f64,
    pub done: f64,
}

impl ColumnModifiers {
    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::Todo => self.todo,
            Column::Doing => self.doing,
            Column::Done => self.done,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFactors {
    /// Reward per complete 25-minute focus unit.
    pub focus_session_reward: i64,
    /// Recovery per rested hour.
    pub break_bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLimits {
    pub max_daily_expenditure: i64,
    /// Recovery for a full night (8h) of sleep.
    pub sleep_recovery: f64,
}

/// The caller-overridable policy configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyPolicy {
    #[serde(default = "default_priority_costs")]
    pub priority_costs: PriorityTable,
    #[serde(default = "default_completion_rewards")]
    pub completion_rewards: PriorityTable,
    #[serde(default = "default_column_modifiers")]
    pub column_modifiers: ColumnModifiers,
    #[serde(default = "default_time_factors")]
    pub time_factors: TimeFactors,
    #[serde(default = "default_daily_limits")]
    pub daily_limits: DailyLimits,
}

fn default_priority_costs() -> PriorityTable {
    PriorityTable {
        low: 5.0,
        medium: 10.0,
        high: 20.0,
        urgent: 30.0,
    }
}

fn default_completion_rewards() -> PriorityTable {
    PriorityTable {
        low: 10.0,
        medium: 20.0,
        high: 35.0,
        urgent: 50.0,
    }
}

fn default_column_modifiers() -> ColumnModifiers {
    ColumnModifiers {
        todo: 0.0,
        doing: 1.0,
        done: -1.0,
    }
}

fn default_time_factors() -> TimeFactors {
    TimeFactors {
        focus_session_reward: 15,
        break_bonus: 5.0,
    }
}

fn default_daily_limits() -> DailyLimits {
    DailyLimits {
        max_daily_expenditure: 100,
        sleep_recovery: 50.0,
    }
}

impl Default for EnergyPolicy {
    fn default() -> Self {
        Self {
            priority_costs: default_priority_costs(),
            completion_rewards: default_completion_rewards(),
            column_modifiers: default_column_modifiers(),
            time_factors: default_time_factors(),
            daily_limits: default_daily_limits(),
        }
    }
}

/// Warning tier from [`EnergyPolicy::energy_limits_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Caution,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsCheck {
    pub is_over_limit: bool,
    pub warning_level: WarningLevel,
    pub recommendation: &'static str,
}

/// Tasks bucketed by whether they fit the user's remaining energy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecommendations {
    pub recommended: Vec<TaskAttributes>,
    pub avoid: Vec<TaskAttributes>,
}

impl EnergyPolicy {
    /// Energy cost of pulling a task into `doing`.
    pub fn task_start_cost(&self, task: &TaskAttributes) -> i64 {
        round(self.priority_costs.get(task.priority) * self.column_modifiers.doing)
    }

    /// Reward for completing a task, plus an overdue bonus of 5 per day
    /// late, capped at 25.
    pub fn task_completion_reward(&self, task: &TaskAttributes, now: DateTime<Utc>) -> i64 {
        let base = self.completion_rewards.get(task.priority);
        let bonus = match task.due_date {
            Some(due) if due < now => {
                let days_overdue = now.signed_duration_since(due).num_days();
                (days_overdue * 5).min(25)
            }
            _ => 0,
        };
        round(base) + bonus
    }

    /// Energy impact of moving a task between board columns.
    ///
    /// Moving to `done` is always the completion reward; `doing -> todo`
    /// is an interruption charged at 30% of the start cost.
    pub fn column_move_impact(
        &self,
        task: &TaskAttributes,
        from: Column,
        to: Column,
        now: DateTime<Utc>,
    ) -> i64 {
        if to == Column::Done {
            return self.task_completion_reward(task, now);
        }
        let cost = self.priority_costs.get(task.priority);
        if from == Column::Doing && to == Column::Todo {
            return round(cost * 0.3);
        }
        round(cost * (self.column_modifiers.get(to) - self.column_modifiers.get(from)))
    }

    /// Reward per complete 25-minute focus unit. Not pro-rated: a
    /// 24-minute session earns nothing.
    pub fn focus_session_reward(&self, duration_minutes: u32) -> i64 {
        (duration_minutes / 25) as i64 * self.time_factors.focus_session_reward
    }

    /// Energy recovered from sleep (capped at one full night) and rest.
    pub fn daily_recovery(&self, hours_slept: f64, hours_rested: f64) -> i64 {
        let sleep = (hours_slept / 8.0).min(1.0) * self.daily_limits.sleep_recovery;
        let rest = hours_rested * self.time_factors.break_bonus;
        round(sleep + rest)
    }

    /// Dual-threshold warning check: relative remaining energy and
    /// absolute daily spend, taking whichever tier is more severe.
    pub fn energy_limits_check(
        &self,
        current_energy: i64,
        max_energy: i64,
        daily_expenditure: i64,
    ) -> LimitsCheck {
        let energy_ratio = if max_energy > 0 {
            current_energy as f64 / max_energy as f64
        } else {
            0.0
        };
        let spend_ratio = if self.daily_limits.max_daily_expenditure > 0 {
            daily_expenditure as f64 / self.daily_limits.max_daily_expenditure as f64
        } else {
            0.0
        };

        let (warning_level, recommendation) = if energy_ratio <= 0.10 || spend_ratio >= 1.0 {
            (
                WarningLevel::Critical,
                "Stop. You are running on empty -- rest before taking on anything else.",
            )
        } else if energy_ratio <= 0.25 || spend_ratio >= 0.8 {
            (
                WarningLevel::Warning,
                "Energy is low. Wrap up the current task, then take a real break.",
            )
        } else if energy_ratio <= 0.50 || spend_ratio >= 0.6 {
            (
                WarningLevel::Caution,
                "Over half your energy is spent. Prefer lighter tasks for a while.",
            )
        } else {
            (WarningLevel::None, "Energy levels look healthy.")
        };

        LimitsCheck {
            is_over_limit: spend_ratio >= 1.0,
            warning_level,
            recommendation,
        }
    }

    /// Bucket tasks into recommended/avoid by remaining-energy band, with
    /// strictly decreasing priority tolerance per band. `recommended` is
    /// sorted by priority (urgent first), then ascending due date.
    pub fn task_recommendations(
        &self,
        tasks: &[TaskAttributes],
        current_energy: i64,
        max_energy: i64,
        now: DateTime<Utc>,
    ) -> TaskRecommendations {
        let ratio = if max_energy > 0 {
            current_energy as f64 / max_energy as f64
        } else {
            0.0
        };

        let fits = |task: &TaskAttributes| -> bool {
            if ratio > 0.7 {
                true
            } else if ratio > 0.4 {
                task.priority != Priority::Urgent
            } else if ratio > 0.2 {
                matches!(task.priority, Priority::Low | Priority::Medium)
            } else {
                // Almost empty: only urgent work due within 24 hours.
                task.priority == Priority::Urgent
                    && task
                        .due_date
                        .is_some_and(|due| due <= now + chrono::Duration::hours(24))
            }
        };

        let mut recommended = Vec::new();
        let mut avoid = Vec::new();
        for task in tasks {
            if fits(task) {
                recommended.push(task.clone());
            } else {
                avoid.push(task.clone());
            }
        }

        recommended.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then_with(|| {
                match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            })
        });

        TaskRecommendations { recommended, avoid }
    }
}

fn round(x: f64) -> i64 {
    x.round() as i64
}
