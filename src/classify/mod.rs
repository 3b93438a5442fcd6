//! Residential / non-residential refinement of unlabelled buildings.

mod boosting;
mod params;
mod refine;
mod scaler;
mod split;
mod tree;

pub use boosting::GradientBoostingClassifier;
pub use params::ClassifierParams;
pub use refine::{factorize, refine_categories, refine_table, RefineSummary};
pub use scaler::StandardScaler;
pub use split::train_test_split;
