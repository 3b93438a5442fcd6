use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Settings of the refinement classifier and its evaluation split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Share of labelled buildings held out for the accuracy report.
    pub test_fraction: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Number of boosting rounds.
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth limit of each regression tree.
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.25,
            seed: 42,
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.test_fraction > 0.0 && self.test_fraction < 1.0,
            "[classify::params] test_fraction must lie in (0, 1), got {}", self.test_fraction);
        ensure!(self.n_estimators >= 1, "[classify::params] n_estimators must be at least 1");
        ensure!(self.learning_rate.is_finite() && self.learning_rate > 0.0,
            "[classify::params] learning_rate must be positive, got {}", self.learning_rate);
        ensure!(self.max_depth >= 1, "[classify::params] max_depth must be at least 1");
        ensure!(self.min_samples_leaf >= 1, "[classify::params] min_samples_leaf must be at least 1");
        Ok(())
    }
}
