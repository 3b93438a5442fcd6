use std::{fs, path::Path};

use anyhow::{Context, Result, bail};

/// Create a stage output directory (and its parents) unless it already exists.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() { return Ok(()) }
    if path.exists() {
        bail!("[common::fs] {} exists but is not a directory", path.display());
    }
    fs::create_dir_all(path)
        .with_context(|| format!("[common::fs] Failed to create directory {}", path.display()))
}

/// Fail unless `path` is an existing directory; stage inputs are never created.
pub(crate) fn require_dir_exists(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => bail!("[common::fs] {} exists but is not a directory", path.display()),
        Err(err) => Err(err).with_context(|| format!("[common::fs] Directory {} is not accessible", path.display())),
    }
}
