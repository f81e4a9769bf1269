//! Common test fixtures for earth-flow tests.
//!
//! The fixtures here have geometry that can be checked by hand: the identity
//! projection maps pixel `(x, y)` to longitude `x`, latitude `y`, and the grids
//! return the same value everywhere.

use chrono::{DateTime, TimeZone, Utc};
use flow_common::{Bounds, ColorScale, Grid, GridValue, ParticleTuning, Rgba, View, Wind};
use projection::{Globe, MaskOutline, Projection};

/// Common view sizes for testing.
pub mod views {
    use flow_common::View;

    /// Smallest view with a meaningful disc mask
    pub const TINY: View = View {
        width: 4,
        height: 4,
    };

    /// Small square view for animation tests
    pub const SMALL: View = View {
        width: 64,
        height: 64,
    };

    /// Wide view, as used by the headless viewer
    pub const WIDE: View = View {
        width: 320,
        height: 160,
    };
}

/// Fixed valid time used by every fixture grid.
pub fn fixture_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 1, 31, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Projection with `x = λ` and `y = φ`, both ways.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        Some((lon, lat))
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((x, y))
    }
}

/// A globe drawn as a disc, using the identity projection.
#[derive(Debug, Clone, Copy)]
pub struct DiscGlobe {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    projection: IdentityProjection,
}

impl DiscGlobe {
    pub fn new(cx: f64, cy: f64, r: f64) -> Self {
        Self {
            cx,
            cy,
            r,
            projection: IdentityProjection,
        }
    }

    /// The largest disc centered in `view`.
    pub fn centered(view: View) -> Self {
        let cx = view.width as f64 / 2.0;
        let cy = view.height as f64 / 2.0;
        Self::new(cx, cy, cx.min(cy))
    }
}

impl Globe for DiscGlobe {
    fn projection(&self) -> &dyn Projection {
        &self.projection
    }

    fn bounds(&self, view: View) -> Bounds {
        Bounds::clamped(
            self.cx - self.r,
            self.cy - self.r,
            self.cx + self.r,
            self.cy + self.r,
            view,
        )
    }

    fn mask_outline(&self, _view: View) -> MaskOutline {
        MaskOutline::Circle {
            cx: self.cx,
            cy: self.cy,
            r: self.r,
        }
    }
}

/// A globe covering the whole view, using the identity projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullViewGlobe {
    projection: IdentityProjection,
}

impl FullViewGlobe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Globe for FullViewGlobe {
    fn projection(&self) -> &dyn Projection {
        &self.projection
    }

    fn bounds(&self, view: View) -> Bounds {
        Bounds::of_view(view)
    }

    fn mask_outline(&self, view: View) -> MaskOutline {
        let w = view.width as f64;
        let h = view.height as f64;
        MaskOutline::Polygon(vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)])
    }
}

/// Gray ramp: a value `v` maps to `rgb(v, v, v)` clamped to `[0, 255]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayScale;

impl ColorScale for GrayScale {
    fn gradient(&self, value: f64, alpha: u8) -> Rgba {
        let level = value.round().clamp(0.0, 255.0) as u8;
        Rgba::new(level, level, level, alpha)
    }

    fn bounds(&self) -> (f64, f64) {
        (0.0, 255.0)
    }
}

/// A vector grid with the same wind everywhere.
///
/// An optional longitude gap returns no data, which the field builder turns
/// into holes.
#[derive(Debug, Clone)]
pub struct ConstantGrid {
    name: String,
    wind: Wind,
    particles: Option<ParticleTuning>,
    gap: Option<(f64, f64)>,
}

impl ConstantGrid {
    /// Wind `(u, v)` reporting `magnitude`, with unit velocity scale and a
    /// max intensity of 10.
    pub fn new(u: f64, v: f64, magnitude: f64) -> Self {
        Self {
            name: "constant".to_string(),
            wind: Wind::with_magnitude(u, v, magnitude),
            particles: Some(ParticleTuning {
                velocity_scale: 1.0,
                max_intensity: 10.0,
            }),
            gap: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_particles(mut self, particles: Option<ParticleTuning>) -> Self {
        self.particles = particles;
        self
    }

    /// Return no data for longitudes in `[min_lon, max_lon]`.
    pub fn with_gap(mut self, min_lon: f64, max_lon: f64) -> Self {
        self.gap = Some((min_lon, max_lon));
        self
    }
}

impl Grid for ConstantGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn date(&self) -> DateTime<Utc> {
        fixture_date()
    }

    fn interpolate(&self, lon: f64, _lat: f64) -> Option<GridValue> {
        match self.gap {
            Some((min, max)) if lon >= min && lon <= max => None,
            _ => Some(GridValue::Vector(self.wind)),
        }
    }

    fn scale(&self) -> &dyn ColorScale {
        &GrayScale
    }

    fn particles(&self) -> Option<ParticleTuning> {
        self.particles
    }
}

/// A scalar grid with the same value everywhere.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    name: String,
    value: f64,
}

impl ScalarGrid {
    pub fn new(value: f64) -> Self {
        Self {
            name: "scalar".to_string(),
            value,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Grid for ScalarGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn date(&self) -> DateTime<Utc> {
        fixture_date()
    }

    fn interpolate(&self, _lon: f64, _lat: f64) -> Option<GridValue> {
        Some(GridValue::Scalar(self.value))
    }

    fn scale(&self) -> &dyn ColorScale {
        &GrayScale
    }

    fn particles(&self) -> Option<ParticleTuning> {
        None
    }
}
