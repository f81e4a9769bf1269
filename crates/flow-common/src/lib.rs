//! Common types and utilities shared across the earth-flow crates.

pub mod bounds;
pub mod color;
pub mod error;
pub mod grid;
pub mod math;
pub mod regular;

pub use bounds::{Bounds, View};
pub use color::{ColorScale, Rgba};
pub use error::{FlowError, FlowResult};
pub use grid::{Grid, GridPair, GridValue, ParticleTuning, Wind};
pub use regular::{GridData, GridSpec, RegularGrid};
