pub mod energy;
pub mod stats;
pub mod timer;
