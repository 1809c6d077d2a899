use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use chronobank_core::storage::FileStore;
use chronobank_core::{
    Config, DurationPresets, MultiTimerRegistry, Priority, SessionDb, SessionKind, TaskSnapshot,
};

use super::energy::{load_ledger, save_ledger};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Focus,
    Break,
    LongBreak,
}

impl From<KindArg> for SessionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Focus => SessionKind::Focus,
            KindArg::Break => SessionKind::Break,
            KindArg::LongBreak => SessionKind::LongBreak,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a timer for a task
    Start {
        /// Task ID to time
        task_id: String,
        /// Session kind
        #[arg(long, value_enum, default_value = "focus")]
        kind: KindArg,
        /// Task title snapshot
        #[arg(long)]
        title: Option<String>,
        /// Task priority snapshot (low/medium/high/urgent)
        #[arg(long)]
        priority: Option<String>,
        /// Hourly rate snapshot in USD
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Pause a running timer
    Pause { task_id: String },
    /// Resume a paused timer
    Resume { task_id: String },
    /// Stop a timer, record the session and any focus reward
    Stop {
        task_id: String,
        /// Override the billed minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Print all active timers as JSON
    Status,
    /// Re-run snapshot recovery and print what was restored or dropped
    Restore,
}

fn open_registry(presets: &DurationPresets) -> Result<MultiTimerRegistry, Box<dyn std::error::Error>> {
    let store = FileStore::open_default()?;
    let mut registry = MultiTimerRegistry::new(Box::new(store), presets.clone());
    registry.restore();
    Ok(registry)
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut registry = open_registry(&config.durations)?;

    match action {
        TimerAction::Start {
            task_id,
            kind,
            title,
            priority,
            rate,
        } => {
            let metadata = TaskSnapshot {
                task_title: title,
                task_priority: priority.as_deref().map(Priority::from_str_lossy),
                hourly_rate: rate,
                notes: None,
            };
            let event = registry.start_timer(&task_id, kind.into(), Some(metadata))?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Pause { task_id } => {
            match registry.pause_timer(&task_id)? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&registry.snapshot_event(Utc::now()))?),
            }
        }
        TimerAction::Resume { task_id } => {
            match registry.resume_timer(&task_id)? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&registry.snapshot_event(Utc::now()))?),
            }
        }
        TimerAction::Stop { task_id, minutes } => {
            let now = Utc::now();
            let stopped = registry.stop_timer(&task_id, minutes)?;

            // Hand the finished session to the server of record.
            let db = SessionDb::open()?;
            let rate = stopped.session.metadata.as_ref().and_then(|m| m.hourly_rate);
            let record = db.record_session(
                stopped.session.task_id.as_deref(),
                stopped.session.kind,
                stopped.outcome.elapsed_secs,
                rate,
                stopped.session.started_at,
                now,
            )?;

            // Focus sessions may earn a quantized energy reward.
            if stopped.session.kind == SessionKind::Focus {
                let mut store = FileStore::open_default()?;
                let mut ledger = load_ledger(&store, &config.bank);
                ledger.record_focus_completion(
                    &config.policy,
                    stopped.session.task_id.clone(),
                    stopped.outcome.actual_minutes,
                    now,
                );
                save_ledger(&mut store, &ledger)?;
            }

            let output = serde_json::json!({
                "event": stopped.event,
                "session": record,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        TimerAction::Status => {
            let snapshot = registry.snapshot_event(Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        TimerAction::Restore => {
            // open_registry already restored; rerun to report the outcome
            // of a fresh pass over the persisted snapshot.
            let events = registry.restore();
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }

    for warning in registry.take_warnings() {
        eprintln!("warning: {}", serde_json::to_string(&warning)?);
    }
    Ok(())
}
