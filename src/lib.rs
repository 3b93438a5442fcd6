#![doc = "BlockAtlas public API"]
mod batch;
mod building;
mod classify;
mod cluster;
mod common;
mod district;
mod footprint;
mod io;
mod pipeline;
mod stats;
mod store;

#[doc(inline)]
pub use building::{columns, district_of, BoundaryType, BuildingCategory, BuildingTable, DISTRICT_PREFIX_LEN};

#[doc(inline)]
pub use footprint::{engineer_features, parse_levels, shape_size, total_area, FeatureSummary, FootprintShape, AREA_SCALE};

#[doc(inline)]
pub use district::{aggregate_district, aggregate_units, district_codes};

#[doc(inline)]
pub use cluster::{assign_building_blocks, hdbscan, local_plane, BlockSummary, ClusterParams, NOISE_LABEL};

#[doc(inline)]
pub use classify::{
    factorize, refine_categories, refine_table, train_test_split,
    ClassifierParams, GradientBoostingClassifier, RefineSummary, StandardScaler,
};

#[doc(inline)]
pub use batch::{pending_units, run_batch, BatchReport, UnitOutcome, UnitReport, UnitStatus};

#[doc(inline)]
pub use store::{DiskStore, MemStore, UnitStore};

#[doc(inline)]
pub use pipeline::{Pipeline, PipelineConfig, PipelinePaths, Stores};

#[doc(inline)]
pub use stats::{category_stats, stats_frame, write_stats_csv, CategoryStats};
