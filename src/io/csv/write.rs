//! CSV writing operations.

use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::CsvWriter};
use tempfile::NamedTempFile;

/// Write a DataFrame to a CSV file, all-or-nothing.
///
/// The table is written to a temporary file next to `path` and renamed over it
/// once complete, so readers and resumption scans never see a partial file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("[io::csv::write] Failed to create temp file in {}", dir.display()))?;

    CsvWriter::new(tmp.as_file_mut())
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all().ok(); // best-effort fsync file

    tmp.persist(path)
        .with_context(|| format!("[io::csv::write] Failed to rename into {}", path.display()))?;
    if let Ok(dir) = File::open(dir) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Write a DataFrame to a CSV string.
#[cfg(test)]
pub(crate) fn write_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .finish(df)
        .context("[io::csv::write] Failed to write CSV to string")?;
    String::from_utf8(buffer)
        .context("[io::csv::write] CSV output is not valid UTF-8")
}
