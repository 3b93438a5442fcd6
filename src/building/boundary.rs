use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Number of leading code characters shared by every unit of one district.
pub const DISTRICT_PREFIX_LEN: usize = 5;

/// How processing units are keyed on storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    /// Official community code (Amtlicher Gemeindeschlüssel).
    #[default]
    Ags,
    /// Postal code.
    Plz,
}

impl BoundaryType {
    /// Token used in file names and as the region-list column name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ags => "ags",
            Self::Plz => "plz",
        }
    }
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for BoundaryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ags" => Ok(Self::Ags),
            "plz" => Ok(Self::Plz),
            other => bail!("[building::boundary] unknown boundary type '{other}' (expected ags or plz)"),
        }
    }
}

/// District code of a unit code: its first five characters.
/// Codes shorter than the prefix are returned whole.
pub fn district_of(code: &str) -> &str {
    match code.char_indices().nth(DISTRICT_PREFIX_LEN) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

/// Whether the unit `code` belongs to `district`.
#[inline]
pub fn in_district(code: &str, district: &str) -> bool {
    code.starts_with(district)
}
