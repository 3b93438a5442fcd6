//! Density-based grouping of building centroids into building blocks.

mod blocks;
mod hierarchy;
mod params;
mod projection;
mod tree;

pub use blocks::{assign_building_blocks, BlockSummary, NOISE_LABEL};
pub use hierarchy::hdbscan;
pub use params::ClusterParams;
pub use projection::local_plane;
