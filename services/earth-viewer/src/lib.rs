//! Headless earth viewer.
//!
//! Loads wind grids, places them on a globe, and animates particles through the
//! resulting field, writing each frame as a PNG.
//!
//! This module exposes the internal modules for testing purposes.

pub mod config;
pub mod grids;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod report;

pub use config::ViewerConfig;
pub use pipeline::{Pipeline, PipelineSettings, RenderSignal, Surfaces};
pub use report::Reporter;
