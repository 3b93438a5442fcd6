use std::{collections::{BTreeMap, BTreeSet}, path::{Path, PathBuf}, sync::Mutex};

use anyhow::{Context, Result, anyhow};
use polars::frame::DataFrame;
use regex::Regex;
use walkdir::WalkDir;

use crate::{building::{BoundaryType, BuildingTable}, common::require_dir_exists, io::csv::{read_csv, write_csv}};

/// Persisted building tables, one per processing unit (municipality, postal
/// code or district), keyed by unit code.
///
/// Presence of a unit's table is the only record that the unit is complete.
pub trait UnitStore: Send + Sync {
    /// Codes of every unit with a persisted table, scanned once.
    fn completed(&self) -> Result<BTreeSet<String>>;

    fn has(&self, code: &str) -> bool;

    fn read(&self, code: &str) -> Result<BuildingTable>;

    /// Persist a unit's table. Either the whole table lands or nothing does.
    fn write(&self, code: &str, table: &mut BuildingTable) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Directory of `buildings_<boundary>_<code>.csv` files.
pub struct DiskStore {
    root: PathBuf,
    boundary: BoundaryType,
    pattern: Regex,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>, boundary: BoundaryType) -> Result<Self> {
        let pattern = Regex::new(&format!(r"^buildings_{}_([0-9A-Za-z]+)\.csv$", boundary.code()))
            .context("[store::disk] Failed to build file name pattern")?;
        Ok(Self { root: root.into(), boundary, pattern })
    }

    #[inline] pub fn root(&self) -> &Path { &self.root }

    /// File name of a unit's table.
    pub fn file_name(&self, code: &str) -> String {
        format!("buildings_{}_{code}.csv", self.boundary.code())
    }

    fn full(&self, code: &str) -> PathBuf { self.root.join(self.file_name(code)) }

    /// Unit code encoded in a file name, if it follows the naming convention.
    pub fn parse_file_name(&self, name: &str) -> Option<String> {
        self.pattern.captures(name).map(|caps| caps[1].to_string())
    }
}

impl UnitStore for DiskStore {
    fn completed(&self) -> Result<BTreeSet<String>> {
        require_dir_exists(&self.root)?;
        let mut codes = BTreeSet::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("[store::disk] Failed to list {}", self.root.display()))?;
            if !entry.file_type().is_file() { continue }
            if let Some(code) = self.parse_file_name(&entry.file_name().to_string_lossy()) {
                codes.insert(code);
            }
        }
        Ok(codes)
    }

    fn has(&self, code: &str) -> bool { self.full(code).is_file() }

    fn read(&self, code: &str) -> Result<BuildingTable> {
        read_csv(&self.full(code)).map(BuildingTable::new)
    }

    fn write(&self, code: &str, table: &mut BuildingTable) -> Result<()> {
        write_csv(table.frame_mut(), &self.full(code))
    }

    fn location(&self) -> String { self.root.display().to_string() }
}

/// In-memory store.
#[derive(Default)]
pub struct MemStore {
    tables: Mutex<BTreeMap<String, DataFrame>>,
}

impl MemStore {
    pub fn new() -> Self { Self::default() }

    /// Store pre-populated with the given tables.
    pub fn with_tables(tables: impl IntoIterator<Item = (String, DataFrame)>) -> Self {
        Self { tables: Mutex::new(tables.into_iter().collect()) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, DataFrame>>> {
        self.tables.lock().map_err(|_| anyhow!("[store::mem] store lock poisoned"))
    }
}

impl UnitStore for MemStore {
    fn completed(&self) -> Result<BTreeSet<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn has(&self, code: &str) -> bool {
        self.lock().map(|tables| tables.contains_key(code)).unwrap_or(false)
    }

    fn read(&self, code: &str) -> Result<BuildingTable> {
        self.lock()?.get(code).cloned()
            .map(BuildingTable::new)
            .ok_or_else(|| anyhow!("[store::mem] missing table for unit {code}"))
    }

    fn write(&self, code: &str, table: &mut BuildingTable) -> Result<()> {
        self.lock()?.insert(code.to_string(), table.frame().clone());
        Ok(())
    }

    fn location(&self) -> String { "memory".to_string() }
}
