//! Per-category summary statistics of a district's buildings.

use std::path::Path;

use anyhow::Result;
use polars::prelude::*;

use crate::{building::{BuildingTable, columns}, io::csv::write_csv};

/// Count, mean and population standard deviation of the shape features of
/// one building category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub mean_surface_area: f64,
    pub sd_surface_area: f64,
    pub mean_rectangularity: f64,
    pub sd_rectangularity: f64,
}

/// One row per category present in `table`, sorted by category label, with
/// columns `building_types`, `count`, `mean_surface_area`, `sd_surface_area`,
/// `mean_rectangularity` and `sd_rectangularity`.
pub fn stats_frame(table: &BuildingTable) -> Result<DataFrame> {
    let categories = table.categories()?;
    let frame = DataFrame::new(vec![
        Column::new(columns::CATEGORY.into(), categories.iter().map(|c| c.as_str()).collect::<Vec<_>>()),
        Column::new(columns::SURFACE_AREA.into(), table.required_floats(columns::SURFACE_AREA)?),
        Column::new(columns::RECTANGULARITY.into(), table.required_floats(columns::RECTANGULARITY)?),
    ])?;

    Ok(frame.lazy()
        .group_by([col(columns::CATEGORY)])
        .agg([
            len().cast(DataType::UInt64).alias("count"),
            col(columns::SURFACE_AREA).mean().alias("mean_surface_area"),
            col(columns::SURFACE_AREA).std(0).alias("sd_surface_area"),
            col(columns::RECTANGULARITY).mean().alias("mean_rectangularity"),
            col(columns::RECTANGULARITY).std(0).alias("sd_rectangularity"),
        ])
        .sort([columns::CATEGORY], SortMultipleOptions::default())
        .collect()?)
}

/// Rows of [`stats_frame`] as structs.
pub fn category_stats(table: &BuildingTable) -> Result<Vec<CategoryStats>> {
    let frame = stats_frame(table)?;
    let floats = |name: &str| -> Result<Vec<f64>> {
        Ok(frame.column(name)?.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    };
    let categories = frame.column(columns::CATEGORY)?.str()?.into_iter()
        .map(|c| c.unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    let counts = frame.column("count")?.u64()?.into_iter()
        .map(|n| n.unwrap_or(0) as usize)
        .collect::<Vec<_>>();
    let (mean_area, sd_area) = (floats("mean_surface_area")?, floats("sd_surface_area")?);
    let (mean_rect, sd_rect) = (floats("mean_rectangularity")?, floats("sd_rectangularity")?);

    Ok((0..frame.height())
        .map(|i| CategoryStats {
            category: categories[i].clone(),
            count: counts[i],
            mean_surface_area: mean_area[i],
            sd_surface_area: sd_area[i],
            mean_rectangularity: mean_rect[i],
            sd_rectangularity: sd_rect[i],
        })
        .collect())
}

/// Write a statistics table to `path` as CSV.
pub fn write_stats_csv(stats: &mut DataFrame, path: &Path) -> Result<()> {
    write_csv(stats, path)
}
