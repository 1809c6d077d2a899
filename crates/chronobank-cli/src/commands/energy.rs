use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use chronobank_core::energy::{TaskAttributes, TransactionType};
use chronobank_core::storage::{DurableStore, EnergyBankConfig, FileStore};
use chronobank_core::{Config, EnergyLedger};

const LEDGER_KEY: &str = "energy_ledger";

#[derive(Clone, Copy, ValueEnum)]
pub enum TypeArg {
    TaskStart,
    TaskComplete,
    TaskMove,
    FocusSession,
    Break,
    Sleep,
}

impl From<TypeArg> for TransactionType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::TaskStart => TransactionType::TaskStart,
            TypeArg::TaskComplete => TransactionType::TaskComplete,
            TypeArg::TaskMove => TransactionType::TaskMove,
            TypeArg::FocusSession => TransactionType::FocusSession,
            TypeArg::Break => TransactionType::Break,
            TypeArg::Sleep => TransactionType::Sleep,
        }
    }
}

#[derive(Subcommand)]
pub enum EnergyAction {
    /// Print the derived energy state and warning level
    Status,
    /// Append a transaction to the ledger
    Record {
        /// Transaction type
        #[arg(long, value_enum)]
        kind: TypeArg,
        /// Signed energy delta
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
        /// Associated task, if any
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Bucket tasks into recommended/avoid for the current energy level
    Recommend {
        /// JSON file holding an array of task attributes
        #[arg(long)]
        tasks_file: PathBuf,
    },
}

/// Load the persisted ledger, or bootstrap a fresh one from config.
pub fn load_ledger(store: &FileStore, bank: &EnergyBankConfig) -> EnergyLedger {
    if let Ok(Some(bytes)) = store.get(LEDGER_KEY) {
        if let Ok(ledger) = serde_json::from_slice::<EnergyLedger>(&bytes) {
            return ledger;
        }
    }
    EnergyLedger::new(bank.initial_energy, bank.max_energy)
}

pub fn save_ledger(
    store: &mut FileStore,
    ledger: &EnergyLedger,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = serde_json::to_vec(ledger)?;
    store.set(LEDGER_KEY, &bytes)?;
    Ok(())
}

pub fn run(action: EnergyAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut store = FileStore::open_default()?;
    let mut ledger = load_ledger(&store, &config.bank);

    match action {
        EnergyAction::Status => {
            let now = Utc::now();
            let state = ledger.bank_state(now);
            let check = config.policy.energy_limits_check(
                state.current_energy,
                state.max_energy,
                state.daily_expenditure,
            );
            let output = serde_json::json!({
                "state": state,
                "raw_balance": ledger.current_balance(),
                "limits": check,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        EnergyAction::Record { kind, delta, task_id } => {
            let transaction = ledger.record(kind.into(), delta, task_id, None).clone();
            let event = ledger.recorded_event(&transaction);
            save_ledger(&mut store, &ledger)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EnergyAction::Recommend { tasks_file } => {
            let text = std::fs::read_to_string(&tasks_file)?;
            let tasks: Vec<TaskAttributes> = serde_json::from_str(&text)?;
            let state = ledger.bank_state(Utc::now());
            let recs = config.policy.task_recommendations(
                &tasks,
                state.current_energy,
                state.max_energy,
                Utc::now(),
            );
            println!("{}", serde_json::to_string_pretty(&recs)?);
        }
    }
    Ok(())
}
