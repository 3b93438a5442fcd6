mod boundary;
mod category;
mod table;

pub use boundary::{district_of, in_district, BoundaryType, DISTRICT_PREFIX_LEN};
pub use category::BuildingCategory;
pub use table::BuildingTable;

/// Column names of the persisted building tables.
pub mod columns {
    pub const ID: &str = "id";
    pub const LAT: &str = "center.lat";
    pub const LON: &str = "center.lon";
    pub const GEOMETRY: &str = "geometry";
    pub const LEVELS: &str = "building_levels";
    pub const CATEGORY: &str = "building_types";

    // Feature engine
    pub const RECTANGULARITY: &str = "rectangularity";
    pub const SURFACE_AREA: &str = "surface_area";
    pub const TOTAL_AREA: &str = "total_area";

    // Block clustering
    pub const BUILDING_BLOCK: &str = "building_block";
}
