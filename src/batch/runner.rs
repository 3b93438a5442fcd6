use std::{collections::BTreeSet, panic::{self, AssertUnwindSafe}};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use super::{BatchReport, UnitOutcome, UnitReport, UnitStatus};

/// Candidates not yet in `completed`, keeping candidate order and dropping
/// duplicates.
pub fn pending_units(candidates: impl IntoIterator<Item = String>, completed: &BTreeSet<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    candidates.into_iter()
        .filter(|code| !completed.contains(code) && seen.insert(code.clone()))
        .collect()
}

/// Run `work` on every unit of `todo`, each inside its own failure boundary.
///
/// An error or panic in one unit is logged with its position and recorded as
/// `Failed`; the remaining units still run. With `jobs > 1` units run on a
/// dedicated rayon pool of that size. Reports come back in `todo` order.
pub fn run_batch<F>(stage: &str, todo: &[String], already_done: usize, jobs: usize, work: F) -> Result<BatchReport>
where
    F: Fn(&str) -> Result<UnitOutcome> + Sync,
{
    let total = todo.len();
    info!(stage, total, already_done, "Starting batch");

    let run_one = |(index, unit): (usize, &String)| run_unit(stage, unit, index + 1, total, &work);
    let units = if jobs > 1 && total > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("[batch::runner] Failed to build worker pool")?;
        pool.install(|| todo.par_iter().enumerate().map(run_one).collect::<Vec<_>>())
    } else {
        todo.iter().enumerate().map(run_one).collect()
    };

    let report = BatchReport { stage: stage.to_string(), already_done, units };
    info!(stage,
        already_done = report.already_done,
        processed = report.processed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Finished batch");
    Ok(report)
}

fn run_unit<F>(stage: &str, unit: &str, position: usize, total: usize, work: &F) -> UnitReport
where
    F: Fn(&str) -> Result<UnitOutcome>,
{
    // Engine log lines inherit the unit fields from this span.
    let span = info_span!("unit", stage, unit, position);
    let status = match span.in_scope(|| panic::catch_unwind(AssertUnwindSafe(|| work(unit)))) {
        Ok(Ok(outcome)) => UnitStatus::from(outcome),
        Ok(Err(err)) => UnitStatus::Failed { reason: format!("{err:#}") },
        Err(payload) => UnitStatus::Failed { reason: panic_message(payload.as_ref()) },
    };

    match &status {
        UnitStatus::Done { rows } => info!(stage, unit, position, total, rows, "Unit done"),
        UnitStatus::Skipped { reason } => info!(stage, unit, position, total, reason = %reason, "Unit skipped"),
        UnitStatus::Failed { reason } => warn!(stage, unit, position, total, reason = %reason, "Unit failed"),
    }
    UnitReport { unit: unit.to_string(), position, status }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let message = payload.downcast_ref::<&str>().map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panicked: {message}")
}
