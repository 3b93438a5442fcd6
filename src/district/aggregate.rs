use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

use crate::{building::{BuildingTable, district_of, in_district}, store::UnitStore};

/// Distinct district codes of the given unit codes, sorted.
pub fn district_codes<'a>(codes: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    codes.into_iter()
        .map(|code| district_of(code).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unit codes belonging to `district`, in sorted order.
pub fn district_members(codes: &BTreeSet<String>, district: &str) -> Vec<String> {
    codes.iter().filter(|code| in_district(code, district)).cloned().collect()
}

/// Concatenate every unit table of `district` found in `store`.
///
/// An empty table means no unit matched; callers treat that as nothing to do.
pub fn aggregate_district(store: &dyn UnitStore, district: &str) -> Result<BuildingTable> {
    let members = district_members(&store.completed()?, district);
    aggregate_units(store, &members)
}

/// Concatenate the tables of `members` into one table.
///
/// Only columns present in every table survive, in the order of the first
/// table; a column whose type differs between tables is kept as text.
pub fn aggregate_units(store: &dyn UnitStore, members: &[String]) -> Result<BuildingTable> {
    let frames = members.iter()
        .map(|code| store.read(code)
            .map(BuildingTable::into_frame)
            .with_context(|| format!("[district::aggregate] Failed to read unit {code}")))
        .collect::<Result<Vec<_>>>()?;

    let Some(first) = frames.first() else { return Ok(BuildingTable::default()) };

    // Common columns and their reconciled types.
    let mut common = first.get_columns().iter()
        .map(|column| (column.name().to_string(), column.dtype().clone()))
        .collect::<Vec<_>>();
    for frame in &frames[1..] {
        let types = frame.get_columns().iter()
            .map(|column| (column.name().to_string(), column.dtype().clone()))
            .collect::<BTreeMap<_, _>>();
        common.retain(|(name, _)| types.contains_key(name));
        for (name, dtype) in common.iter_mut() {
            if types.get(name).is_some_and(|other| other != dtype) {
                *dtype = DataType::String;
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for (code, frame) in members.iter().zip(&frames) {
        let dropped = frame.width() - common.len();
        if dropped > 0 {
            debug!(unit = %code, dropped, "dropping columns not shared by every unit in the district");
        }
        let columns = common.iter()
            .map(|(name, dtype)| frame.column(name)?.cast(dtype))
            .collect::<PolarsResult<Vec<_>>>()?;
        let frame = DataFrame::new(columns)?;
        match combined.as_mut() {
            Some(acc) => { acc.vstack_mut(&frame)?; }
            None => combined = Some(frame),
        }
    }

    Ok(BuildingTable::new(combined.unwrap_or_default()))
}
