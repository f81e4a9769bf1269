//! Grid contract consumed by the field builder and animator.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::ColorScale;
use crate::{FlowError, FlowResult};

/// A wind (or current) vector with its precomputed magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub u: f64,
    pub v: f64,
    pub magnitude: f64,
}

impl Wind {
    /// Create a vector, computing its magnitude from the components.
    pub fn new(u: f64, v: f64) -> Self {
        Self {
            u,
            v,
            magnitude: u.hypot(v),
        }
    }

    /// Create a vector whose magnitude is carried over from elsewhere.
    ///
    /// Used after distortion, where the components are in screen pixels but the
    /// magnitude stays in data units.
    pub fn with_magnitude(u: f64, v: f64, magnitude: f64) -> Self {
        Self { u, v, magnitude }
    }

    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.v.is_finite() && self.magnitude.is_finite()
    }
}

/// A value sampled from a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridValue {
    Vector(Wind),
    Scalar(f64),
}

impl GridValue {
    /// The value used for coloring: the magnitude of a vector, or the scalar itself.
    pub fn scalar(&self) -> f64 {
        match self {
            GridValue::Vector(wind) => wind.magnitude,
            GridValue::Scalar(value) => *value,
        }
    }

    pub fn as_wind(&self) -> Option<Wind> {
        match self {
            GridValue::Vector(wind) => Some(*wind),
            GridValue::Scalar(_) => None,
        }
    }
}

/// Particle parameters carried by vector grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleTuning {
    /// Screen-height fraction a unit vector moves per frame.
    pub velocity_scale: f64,
    /// Magnitude mapped to the brightest particle style.
    pub max_intensity: f64,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            velocity_scale: 1.0 / 60_000.0,
            max_intensity: 17.0,
        }
    }
}

/// A geographic data source. Immutable once constructed.
pub trait Grid: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Valid time of the data.
    fn date(&self) -> DateTime<Utc>;

    /// Sample the grid at a geographic coordinate. `None` when there is no data there.
    fn interpolate(&self, lon: f64, lat: f64) -> Option<GridValue>;

    fn scale(&self) -> &dyn ColorScale;

    /// Particle parameters, present only for vector grids.
    fn particles(&self) -> Option<ParticleTuning>;

    /// Coordinates `(lon, lat)` of the lattice points that hold data. Empty for grids
    /// not backed by a lattice.
    fn lattice_points(&self) -> Vec<(f64, f64)> {
        Vec::new()
    }
}

/// The primary grid plus an optional distinct overlay grid.
///
/// `overlay == None` means the primary grid doubles as the overlay.
#[derive(Clone)]
pub struct GridPair {
    pub primary: Arc<dyn Grid>,
    pub overlay: Option<Arc<dyn Grid>>,
}

impl GridPair {
    pub fn new(primary: Arc<dyn Grid>) -> Self {
        Self {
            primary,
            overlay: None,
        }
    }

    /// Pair a primary grid with an overlay. Passing the primary grid again yields no
    /// distinct overlay.
    pub fn with_overlay(primary: Arc<dyn Grid>, overlay: Arc<dyn Grid>) -> Self {
        let overlay = if Arc::ptr_eq(&primary, &overlay) {
            None
        } else {
            Some(overlay)
        };
        Self { primary, overlay }
    }

    pub fn has_distinct_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// The grid whose scale colors the overlay.
    pub fn overlay_grid(&self) -> &Arc<dyn Grid> {
        self.overlay.as_ref().unwrap_or(&self.primary)
    }

    /// Particle parameters of the primary grid.
    pub fn particles(&self) -> FlowResult<ParticleTuning> {
        self.primary.particles().ok_or_else(|| {
            FlowError::InvalidGrid(format!(
                "grid '{}' has no particle parameters",
                self.primary.name()
            ))
        })
    }
}

impl fmt::Debug for GridPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridPair")
            .field("primary", &self.primary.name())
            .field("overlay", &self.overlay.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}
