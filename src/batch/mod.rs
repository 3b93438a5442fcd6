//! Resumable, fault-isolated batch processing over processing units.

mod report;
mod runner;

pub use report::{BatchReport, UnitOutcome, UnitReport, UnitStatus};
pub use runner::{pending_units, run_batch};
