use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

/// Naive building category assigned from the raw type tag.
///
/// `ToBeClassified` marks buildings whose tag carried no information (e.g. a
/// bare `building=yes`); the refinement stage may upgrade those, and only
/// those, to `Residential`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildingCategory {
    Residential,
    Commercial,
    AccessoryStorage,
    AccessorySupply,
    Industrial,
    Public,
    ToBeClassified,
    Other,
}

impl BuildingCategory {
    pub const ALL: [BuildingCategory; 8] = [
        Self::Residential,
        Self::Commercial,
        Self::AccessoryStorage,
        Self::AccessorySupply,
        Self::Industrial,
        Self::Public,
        Self::ToBeClassified,
        Self::Other,
    ];

    /// Label as written to and read from storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::AccessoryStorage => "accessory_storage",
            Self::AccessorySupply => "accessory_supply",
            Self::Industrial => "industrial",
            Self::Public => "public",
            Self::ToBeClassified => "to_be_classified",
            Self::Other => "other",
        }
    }

    #[inline] pub fn is_sentinel(&self) -> bool { *self == Self::ToBeClassified }

    /// Binary target for the refinement classifier, `None` for the sentinel.
    #[inline]
    pub fn is_residential(&self) -> Option<bool> {
        (!self.is_sentinel()).then_some(*self == Self::Residential)
    }

    /// Apply a classifier verdict. Only the sentinel can move, and only towards
    /// `Residential`; every other label is returned unchanged.
    #[inline]
    pub fn refine(self, predicted_residential: bool) -> Self {
        if self.is_sentinel() && predicted_residential { Self::Residential } else { self }
    }
}

impl fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildingCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "residential" => Ok(Self::Residential),
            "commercial" => Ok(Self::Commercial),
            "accessory_storage" => Ok(Self::AccessoryStorage),
            "accessory_supply" => Ok(Self::AccessorySupply),
            "industrial" => Ok(Self::Industrial),
            "public" => Ok(Self::Public),
            "to_be_classified" => Ok(Self::ToBeClassified),
            "other" => Ok(Self::Other),
            other => bail!("[building::category] unknown building category '{other}'"),
        }
    }
}
