//! Raster rendering for the flow visualization.
//!
//! - Color scales (sinebow, segmented, particle intensity)
//! - JSON style configuration
//! - Globe visibility masks
//! - Animation and overlay canvases
//! - PNG encoding

pub mod canvas;
pub mod gradient;
pub mod mask;
pub mod png;
pub mod style;

pub use canvas::{Canvas, Segment};
pub use gradient::{SegmentedScale, SinebowScale, WindIntensityScale};
pub use mask::Mask;
pub use style::StyleConfig;
