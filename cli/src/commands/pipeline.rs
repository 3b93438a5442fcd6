use anyhow::Result;
use blockatlas::{BatchReport, Pipeline, PipelineConfig};
use tracing::{info, warn};

use crate::cli::PipelineArgs;

/// Configuration file (or defaults) with command-line overrides applied.
pub fn load_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(boundary) = args.boundary { config.boundary_type = boundary.into() }
    if let Some(jobs) = args.jobs { config.jobs = jobs }
    if let Some(size) = args.min_cluster_size { config.clustering.min_cluster_size = size }
    if let Some(samples) = args.min_samples { config.clustering.min_samples = samples }
    if let Some(epsilon) = args.epsilon { config.clustering.cluster_selection_epsilon_m = epsilon }
    config.validate()?;
    Ok(config)
}

fn summarize(report: &BatchReport) {
    info!("{report}");
    for unit in report.failed_units() {
        warn!(stage = %report.stage, unit, "Unit left incomplete, rerun to retry");
    }
}

pub fn run_all(args: &PipelineArgs) -> Result<()> {
    let pipeline = Pipeline::from_config(load_config(args)?)?;
    for report in pipeline.run_all()? {
        summarize(&report);
    }
    Ok(())
}

pub fn features(args: &PipelineArgs) -> Result<()> {
    summarize(&Pipeline::from_config(load_config(args)?)?.generate_features()?);
    Ok(())
}

pub fn cluster(args: &PipelineArgs) -> Result<()> {
    summarize(&Pipeline::from_config(load_config(args)?)?.cluster_blocks()?);
    Ok(())
}

pub fn classify(args: &PipelineArgs) -> Result<()> {
    summarize(&Pipeline::from_config(load_config(args)?)?.classify_buildings()?);
    Ok(())
}
