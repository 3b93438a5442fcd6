//! IO module for format-specific reading and writing operations.
//!
//! # Format Modules
//!
//! - `csv` - CSV format for building tables and region lists
//! - `wkt` - Well-Known Text reader for footprint polygons

pub(crate) mod csv;
pub(crate) mod wkt;
