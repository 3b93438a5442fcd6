//! CSV reading operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, CsvReader, DataType}};

/// Reads a building CSV from `path` with every column as text.
///
/// Typed views are cast on access, so identifiers and codes keep their leading
/// zeros and one-off columns never break type inference.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads a building CSV from a string.
#[cfg(test)]
pub(crate) fn read_csv_string(csv: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(std::io::Cursor::new(csv.as_bytes()))
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}

/// Reads the unit codes listed in column `column` of a region-list CSV.
pub(crate) fn read_region_codes(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open region list: {}", path.display()))?;
    let df = CsvReader::new(file)
        .with_options(CsvReadOptions::default().with_infer_schema_length(Some(0)))
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read region list from {:?}", path))?;
    ensure!(
        df.get_column_names().iter().any(|name| name.as_str() == column),
        "[io::csv::read] region list {} has no '{column}' column", path.display()
    );

    let codes = df.column(column)?.cast(&DataType::String)?;
    Ok(codes.str()?.into_iter()
        .flatten()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect())
}
