use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Tuning parameters of the block clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Minimum number of buildings that make up a block.
    pub min_cluster_size: usize,
    /// Neighbourhood size for core distances; larger values mark more
    /// buildings as noise.
    pub min_samples: usize,
    /// Blocks born at a separation below this many metres are not split off
    /// from their parent block.
    pub cluster_selection_epsilon_m: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 8,
            min_samples: 2,
            cluster_selection_epsilon_m: 10.0,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.min_cluster_size >= 2, "[cluster::params] min_cluster_size must be at least 2, got {}", self.min_cluster_size);
        ensure!(self.min_samples >= 1, "[cluster::params] min_samples must be at least 1");
        ensure!(self.cluster_selection_epsilon_m.is_finite() && self.cluster_selection_epsilon_m >= 0.0,
            "[cluster::params] cluster_selection_epsilon_m must be a non-negative number of metres, got {}",
            self.cluster_selection_epsilon_m);
        Ok(())
    }
}
