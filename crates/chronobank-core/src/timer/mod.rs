//! Timer session state machine and multi-timer registry.

mod registry;
mod session;

pub use registry::{MultiTimerRegistry, StoppedTimer, STALENESS_WINDOW_HOURS};
pub use session::{DurationPresets, SessionKind, SessionOutcome, SessionState, TaskSnapshot, TimerSession};
