use anyhow::{Context, Result, anyhow, bail, ensure};
use geo::Coord;
use polars::prelude::*;

use crate::building::{BuildingCategory, columns};

/// A table of building rows backed by a Polars DataFrame.
///
/// Every column read from storage is kept, typed views are extracted on demand
/// and derived columns are appended in place.
#[derive(Debug, Clone, Default)]
pub struct BuildingTable {
    frame: DataFrame,
}

impl BuildingTable {
    pub fn new(frame: DataFrame) -> Self { Self { frame } }

    #[inline] pub fn frame(&self) -> &DataFrame { &self.frame }

    #[inline] pub fn frame_mut(&mut self) -> &mut DataFrame { &mut self.frame }

    #[inline] pub fn into_frame(self) -> DataFrame { self.frame }

    /// Number of building rows.
    #[inline] pub fn len(&self) -> usize { self.frame.height() }

    #[inline] pub fn is_empty(&self) -> bool { self.frame.height() == 0 }

    /// Names of all columns, in order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame.get_column_names().into_iter().map(|name| name.to_string()).collect()
    }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_names().iter().any(|col| col.as_str() == name)
    }

    /// Fail unless every named column is present.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing = names.iter()
            .filter(|name| !self.has_column(name))
            .copied()
            .collect::<Vec<_>>();
        ensure!(missing.is_empty(), "[building::table] missing required column(s): {}", missing.join(", "));
        Ok(())
    }

    /// Column values as optional floats; text that does not parse becomes `None`.
    pub fn floats(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.frame.column(name)
            .with_context(|| format!("[building::table] missing column '{name}'"))?
            .cast(&DataType::Float64)
            .with_context(|| format!("[building::table] column '{name}' is not numeric"))?;
        Ok(column.f64()?.into_iter().collect())
    }

    /// Column values as optional strings.
    pub fn strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.frame.column(name)
            .with_context(|| format!("[building::table] missing column '{name}'"))?
            .cast(&DataType::String)?;
        Ok(column.str()?.into_iter().map(|value| value.map(str::to_string)).collect())
    }

    /// Column values as floats, failing on the first null.
    pub fn required_floats(&self, name: &str) -> Result<Vec<f64>> {
        self.floats(name)?.into_iter().enumerate()
            .map(|(row, value)| value.ok_or_else(|| anyhow!("[building::table] null or non-numeric '{name}' at row {row}")))
            .collect()
    }

    /// Centroid coordinates (x = lon, y = lat) of every row.
    pub fn centroids(&self) -> Result<Vec<Coord<f64>>> {
        self.require_columns(&[columns::LAT, columns::LON])?;
        let lats = self.required_floats(columns::LAT)?;
        let lons = self.required_floats(columns::LON)?;
        if let Some(row) = lats.iter().zip(&lons).position(|(lat, lon)| !lat.is_finite() || !lon.is_finite()) {
            bail!("[building::table] non-finite coordinate at row {row}");
        }
        Ok(lons.into_iter().zip(lats).map(|(x, y)| Coord { x, y }).collect())
    }

    /// Naive category of every row.
    pub fn categories(&self) -> Result<Vec<BuildingCategory>> {
        self.strings(columns::CATEGORY)?.into_iter().enumerate()
            .map(|(row, label)| match label {
                Some(label) => label.parse::<BuildingCategory>()
                    .with_context(|| format!("[building::table] bad category at row {row}")),
                None => bail!("[building::table] missing category at row {row}"),
            })
            .collect()
    }

    /// Add or replace a float column.
    pub fn set_floats(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.set_column(Column::new(name.into(), values))
    }

    /// Add or replace a string column.
    pub fn set_strings(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        self.set_column(Column::new(name.into(), values))
    }

    /// Replace the category column.
    pub fn set_categories(&mut self, categories: &[BuildingCategory]) -> Result<()> {
        self.set_strings(
            columns::CATEGORY,
            categories.iter().map(|category| category.as_str().to_string()).collect(),
        )
    }

    fn set_column(&mut self, column: Column) -> Result<()> {
        ensure!(column.len() == self.len(),
            "[building::table] column '{}' has {} values, table has {} rows", column.name(), column.len(), self.len());
        self.frame.with_column(column)?;
        Ok(())
    }

    /// Keep only rows where `mask` is true.
    pub fn retain(&mut self, mask: &[bool]) -> Result<()> {
        ensure!(mask.len() == self.len(), "[building::table] mask length {} != {} rows", mask.len(), self.len());
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        self.frame = self.frame.filter(&mask)?;
        Ok(())
    }
}

impl From<DataFrame> for BuildingTable {
    fn from(frame: DataFrame) -> Self { Self::new(frame) }
}
