use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{building::BoundaryType, classify::ClassifierParams, cluster::ClusterParams};

/// Storage locations of every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinePaths {
    /// Building tables with geometry, one per municipality (feature input).
    pub intermediate: PathBuf,
    /// Feature tables, one per municipality.
    pub primary: PathBuf,
    /// Clustered tables, one per district.
    pub feature: PathBuf,
    /// Classified tables, one per district.
    pub model_output: PathBuf,
    /// CSV listing the units to process in a column named after the boundary type.
    pub region_list: Option<PathBuf>,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            intermediate: PathBuf::from("data/02_intermediate/buildings"),
            primary: PathBuf::from("data/03_primary/buildings"),
            feature: PathBuf::from("data/04_feature/buildings"),
            model_output: PathBuf::from("data/07_model_output/buildings"),
            region_list: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub boundary_type: BoundaryType,
    pub paths: PipelinePaths,
    pub clustering: ClusterParams,
    pub classifier: ClassifierParams,
    /// Units processed concurrently; 1 runs sequentially.
    pub jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            boundary_type: BoundaryType::default(),
            paths: PipelinePaths::default(),
            clustering: ClusterParams::default(),
            classifier: ClassifierParams::default(),
            jobs: 1,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[pipeline::config] Failed to read config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("[pipeline::config] Invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("[pipeline::config] Failed to parse JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.jobs >= 1, "[pipeline::config] jobs must be at least 1");
        self.clustering.validate()?;
        self.classifier.validate()
    }
}
