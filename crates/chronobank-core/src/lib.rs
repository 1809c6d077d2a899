//! # Chronobank Core Library
//!
//! Core business logic for Chronobank: a multi-timer persistence and
//! energy accounting engine. All operations are available via a
//! standalone CLI binary; any GUI is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Timer sessions**: wall-clock-based state machines -- the caller
//!   reads live elapsed time on a display tick; only pause/complete fold
//!   time into the persisted field
//! - **Multi-timer registry**: the set of concurrently active per-task
//!   timers, snapshotted to durable storage on every mutation and
//!   restored (with staleness pruning) at process start
//! - **Energy**: a pure policy table mapping task/session attributes to
//!   energy deltas, plus an append-only transaction ledger
//! - **Stats**: UTC today/week/month earnings-and-hours rollups over
//!   completed sessions
//! - **Storage**: a minimal durable key-value interface for snapshots and
//!   a SQLite session database as the server of record
//!
//! ## Key Components
//!
//! - [`MultiTimerRegistry`]: timer coordination and recovery
//! - [`EnergyPolicy`] / [`EnergyLedger`]: energy accounting
//! - [`aggregate`]: dashboard rollups
//! - [`SessionDb`] / [`Config`]: persistence and configuration

pub mod energy;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use energy::{EnergyLedger, EnergyPolicy, EnergyTransaction, MentalBankState, Priority};
pub use error::{ConfigError, CoreError, StorageError, TimerError};
pub use events::Event;
pub use stats::{aggregate, CompletedSession, PeriodAggregates};
pub use storage::{Config, DurableStore, FileStore, MemoryStore, SessionDb};
pub use timer::{
    DurationPresets, MultiTimerRegistry, SessionKind, SessionState, StoppedTimer, TaskSnapshot,
    TimerSession,
};
