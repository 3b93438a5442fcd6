mod features;
mod shape;

pub use features::{engineer_features, FeatureSummary};
pub use shape::{parse_levels, shape_size, total_area, FootprintShape, AREA_SCALE};
