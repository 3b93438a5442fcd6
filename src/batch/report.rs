use std::fmt;

/// What a unit's work function produced when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// Output persisted; carries the number of rows written.
    Done(usize),
    /// Nothing to do for this unit, with the reason.
    Skipped(String),
}

/// Final state of one unit in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitStatus {
    Done { rows: usize },
    Skipped { reason: String },
    /// Left incomplete; the next run will pick it up again.
    Failed { reason: String },
}

impl UnitStatus {
    #[inline] pub fn is_done(&self) -> bool { matches!(self, Self::Done { .. }) }
    #[inline] pub fn is_skipped(&self) -> bool { matches!(self, Self::Skipped { .. }) }
    #[inline] pub fn is_failed(&self) -> bool { matches!(self, Self::Failed { .. }) }
}

impl From<UnitOutcome> for UnitStatus {
    fn from(outcome: UnitOutcome) -> Self {
        match outcome {
            UnitOutcome::Done(rows) => Self::Done { rows },
            UnitOutcome::Skipped(reason) => Self::Skipped { reason },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub unit: String,
    /// 1-based position in the run's to-do list.
    pub position: usize,
    pub status: UnitStatus,
}

/// Per-unit results of one stage run, in to-do order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub stage: String,
    /// Units whose output already existed and were not scheduled.
    pub already_done: usize,
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn processed(&self) -> usize { self.units.iter().filter(|u| u.status.is_done()).count() }

    pub fn skipped(&self) -> usize { self.units.iter().filter(|u| u.status.is_skipped()).count() }

    pub fn failed(&self) -> usize { self.units.iter().filter(|u| u.status.is_failed()).count() }

    /// Codes of the units that failed.
    pub fn failed_units(&self) -> Vec<&str> {
        self.units.iter().filter(|u| u.status.is_failed()).map(|u| u.unit.as_str()).collect()
    }

    pub fn status_of(&self, unit: &str) -> Option<&UnitStatus> {
        self.units.iter().find(|u| u.unit == unit).map(|u| &u.status)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} already done, {} processed, {} skipped, {} failed",
            self.stage, self.already_done, self.processed(), self.skipped(), self.failed())
    }
}
