//! Globe projections and distortion.
//!
//! A [`Globe`] positions the earth in a view: it owns a [`Projection`] between
//! geographic and screen coordinates, knows the pixel bounds the earth occupies, and
//! describes the outline used to rasterize the visibility mask.

pub mod distortion;
pub mod equirectangular;
pub mod globe;
pub mod orthographic;

pub use distortion::{distort, distortion, DISTORTION_STEP};
pub use equirectangular::Equirectangular;
pub use globe::{Globe, GlobeKind, MaskOutline, Projection};
pub use orthographic::Orthographic;
