use std::collections::BTreeSet;

use anyhow::{Result, ensure};
use tracing::info;

use crate::{building::{BuildingTable, columns}, cluster::{ClusterParams, hdbscan, local_plane}};

/// `building_block` value of buildings outside every block.
pub const NOISE_LABEL: &str = "-1";

/// Outcome of clustering one district.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    /// Distinct `building_block` values, noise included.
    pub labels: usize,
    /// Buildings labelled as noise.
    pub noise: usize,
}

/// Group a district's buildings into blocks and store the result in the
/// `building_block` column.
///
/// Fails when the table is empty or lacks centroid coordinates.
pub fn assign_building_blocks(table: &mut BuildingTable, params: &ClusterParams) -> Result<BlockSummary> {
    ensure!(!table.is_empty(), "[cluster::blocks] no buildings to cluster");
    let centroids = table.centroids()?;

    let labels = hdbscan(&local_plane(&centroids), params)?;
    let blocks = labels.iter()
        .map(|label| label.map_or_else(|| NOISE_LABEL.to_string(), |block| block.to_string()))
        .collect::<Vec<_>>();

    let summary = BlockSummary {
        labels: blocks.iter().collect::<BTreeSet<_>>().len(),
        noise: labels.iter().filter(|label| label.is_none()).count(),
    };
    info!(blocks = summary.labels, noise = summary.noise, buildings = blocks.len(),
        "Generated total of {} building blocks in the area", summary.labels);

    table.set_strings(columns::BUILDING_BLOCK, blocks)?;
    Ok(summary)
}
