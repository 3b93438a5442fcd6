//! Gathering per-municipality building tables into one district table.

mod aggregate;

pub use aggregate::{aggregate_district, aggregate_units, district_codes, district_members};
