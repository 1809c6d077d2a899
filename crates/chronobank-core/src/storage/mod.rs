//! Storage layer: durable key-value snapshots and the session database.

pub mod config;
pub mod database;
mod store;

pub use config::{Config, EnergyBankConfig};
pub use database::{SessionDb, SessionRecord};
pub use store::{DurableStore, FileStore, MemoryStore};

use std::path::PathBuf;

/// Returns `~/.config/chronobank[-dev]/` based on CHRONOBANK_ENV.
///
/// Set CHRONOBANK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CHRONOBANK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("chronobank-dev")
    } else {
        base_dir.join("chronobank")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
