//! Color values and the value-to-color scale contract.

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Maps data values to colors.
pub trait ColorScale: Send + Sync {
    /// Color for `value` with the given alpha in `[0, 255]`.
    fn gradient(&self, value: f64, alpha: u8) -> Rgba;

    /// The `[low, high]` range the scale is defined over.
    fn bounds(&self) -> (f64, f64);
}
