//! Core error types for chronobank-core.
//!
//! This module defines the error hierarchy using thiserror. Timer
//! lifecycle violations, storage faults and configuration problems each
//! get their own enum, folded into a single [`CoreError`] at the crate
//! boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for chronobank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer lifecycle errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timer lifecycle errors.
///
/// `Conflict` and `NotFound` indicate a genuine caller ordering mistake
/// and are surfaced as actionable errors. `InvalidState` is recovered
/// locally by the registry (no-op plus a warning) so that idempotent UI
/// actions never crash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// A non-completed session already exists for this task.
    #[error("Timer already running for task '{task_id}'")]
    Conflict { task_id: String },

    /// No tracked session for this task.
    #[error("No active timer for task '{task_id}'")]
    NotFound { task_id: String },

    /// Transition not valid from the session's current state.
    #[error("Cannot {action} a {state} session")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the session database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Durable snapshot write failed (quota, permissions, serialization).
    /// Non-fatal: in-memory state stays authoritative for the process.
    #[error("Snapshot write failed for key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Durable snapshot read failed
    #[error("Snapshot read failed for key '{key}': {message}")]
    ReadFailed { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(StorageError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
