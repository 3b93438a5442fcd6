use std::path::PathBuf;

use anyhow::{Result, ensure};
use blockatlas::{Pipeline, write_stats_csv};
use tracing::info;

use super::pipeline::load_config;

pub fn run(args: &crate::cli::StatsArgs) -> Result<()> {
    let pipeline = Pipeline::from_config(load_config(&args.pipeline)?)?;
    let classified = pipeline.classified_districts()?;
    ensure!(classified.contains(&args.district),
        "district {} has no classified output (available: {})", args.district,
        classified.iter().cloned().collect::<Vec<_>>().join(", "));
    let mut stats = pipeline.district_stats(&args.district)?;

    let output = args.output.clone()
        .unwrap_or_else(|| PathBuf::from(format!("stats_{}.csv", args.district)));
    write_stats_csv(&mut stats, &output)?;
    info!(district = %args.district, categories = stats.height(), output = %output.display(), "Wrote building type statistics");
    Ok(())
}
