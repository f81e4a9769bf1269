//! Projection and globe traits.

use std::sync::Arc;

use flow_common::{Bounds, View};
use serde::{Deserialize, Serialize};

use crate::{Equirectangular, Orthographic};

/// Mapping between geographic coordinates (degrees) and screen pixels.
pub trait Projection: Send + Sync {
    /// Forward projection. `None` when the point is not visible.
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Inverse projection. `None` when the pixel is off the earth.
    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)>;
}

/// Shape whose interior is the visible earth.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskOutline {
    Circle { cx: f64, cy: f64, r: f64 },
    Polygon(Vec<(f64, f64)>),
}

/// The earth placed in a view.
pub trait Globe: Send + Sync {
    fn projection(&self) -> &dyn Projection;

    /// Pixel bounds of the earth, clamped to the view.
    fn bounds(&self, view: View) -> Bounds;

    /// Outline rasterized into the visibility mask.
    fn mask_outline(&self, view: View) -> MaskOutline;
}

/// Globe types selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobeKind {
    #[default]
    Orthographic,
    Equirectangular,
}

impl GlobeKind {
    /// Build a globe of this kind fitted to `view`, centered on `(lon, lat)`.
    pub fn build(self, view: View, center: (f64, f64)) -> Arc<dyn Globe> {
        match self {
            GlobeKind::Orthographic => Arc::new(Orthographic::fit(view, center.0, center.1)),
            GlobeKind::Equirectangular => Arc::new(Equirectangular::fit(view, center.0)),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "orthographic" => Some(GlobeKind::Orthographic),
            "equirectangular" => Some(GlobeKind::Equirectangular),
            _ => None,
        }
    }
}
