//! Dashboard rollups over completed sessions.

mod periods;

pub use periods::{
    aggregate, day_start, month_start, week_start, CompletedSession, PeriodAggregates,
    PeriodTotals,
};
