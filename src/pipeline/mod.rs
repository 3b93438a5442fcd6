//! The three persisted stages and their configuration.

mod config;
mod stages;

pub use config::{PipelineConfig, PipelinePaths};
pub use stages::{Pipeline, Stores};
