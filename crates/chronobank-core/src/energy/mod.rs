//! Energy accounting: the pure policy table and the append-only ledger.

mod ledger;
mod policy;

pub use ledger::{EnergyLedger, EnergyTransaction, MentalBankState, TransactionType, WeeklyStats};
pub use policy::{
    Column, ColumnModifiers, DailyLimits, EnergyPolicy, LimitsCheck, Priority, PriorityTable,
    TaskAttributes, TaskRecommendations, TimeFactors, WarningLevel,
};
