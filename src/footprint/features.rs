use anyhow::Result;
use tracing::debug;

use crate::{building::{BuildingTable, columns}, footprint::{parse_levels, shape_size, total_area}, io::wkt::multipolygon_from_wkt};

/// Row counts from one feature-engineering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureSummary {
    /// Rows kept with features attached.
    pub kept: usize,
    /// Rows dropped because their geometry was null or `EMPTY`.
    pub missing_geometry: usize,
    /// Rows dropped because their geometry could not be read or had no area.
    pub malformed_geometry: usize,
}

/// Attach `rectangularity`, `surface_area` and `total_area` to every building
/// with a usable footprint, dropping the rows without one.
///
/// The levels column is optional; missing levels count as one.
pub fn engineer_features(table: &mut BuildingTable) -> Result<FeatureSummary> {
    table.require_columns(&[columns::GEOMETRY])?;
    let geometries = table.strings(columns::GEOMETRY)?;
    let levels = if table.has_column(columns::LEVELS) {
        table.strings(columns::LEVELS)?
    } else {
        vec![None; table.len()]
    };

    let mut summary = FeatureSummary::default();
    let mut keep = Vec::with_capacity(table.len());
    let (mut rectangularity, mut surface_area, mut total) = (Vec::new(), Vec::new(), Vec::new());

    for (row, (wkt, levels)) in geometries.iter().zip(&levels).enumerate() {
        let Some(wkt) = wkt.as_deref().filter(|text| !text.trim().is_empty()) else {
            summary.missing_geometry += 1;
            keep.push(false);
            continue;
        };

        let shape = match multipolygon_from_wkt(wkt) {
            Ok(Some(footprint)) => shape_size(&footprint),
            Ok(None) => {
                summary.missing_geometry += 1;
                keep.push(false);
                continue;
            }
            Err(e) => {
                debug!(row, error = %e, "unreadable footprint geometry");
                None
            }
        };

        match shape {
            Some(shape) => {
                rectangularity.push(shape.rectangularity);
                surface_area.push(shape.surface_area);
                total.push(total_area(shape.surface_area, parse_levels(levels.as_deref())));
                keep.push(true);
                summary.kept += 1;
            }
            None => {
                summary.malformed_geometry += 1;
                keep.push(false);
            }
        }
    }

    table.retain(&keep)?;
    table.set_floats(columns::RECTANGULARITY, rectangularity)?;
    table.set_floats(columns::SURFACE_AREA, surface_area)?;
    table.set_floats(columns::TOTAL_AREA, total)?;
    Ok(summary)
}
