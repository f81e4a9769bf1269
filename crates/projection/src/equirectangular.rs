//! Equirectangular (plate carrée) projection.

use std::f64::consts::PI;

use flow_common::math::floor_mod;
use flow_common::{Bounds, View};

use crate::{Globe, MaskOutline, Projection};

/// Equirectangular globe: longitude and latitude map linearly to x and y, north up.
#[derive(Debug, Clone)]
pub struct Equirectangular {
    /// Central meridian (degrees)
    pub lon0: f64,
    /// Pixels per radian
    pub scale: f64,
    /// Screen position of `(lon0, 0)`
    pub translate: (f64, f64),
}

impl Equirectangular {
    pub fn new(lon0: f64, scale: f64, translate: (f64, f64)) -> Self {
        Self {
            lon0,
            scale,
            translate,
        }
    }

    /// Fit the whole map into `view`, centered on `lon0`.
    pub fn fit(view: View, lon0: f64) -> Self {
        let scale = (view.width as f64 / (2.0 * PI)).min(view.height as f64 / PI);
        let translate = (view.width as f64 / 2.0, view.height as f64 / 2.0);
        Self::new(lon0, scale, translate)
    }

    fn corners(&self) -> (f64, f64, f64, f64) {
        let (cx, cy) = self.translate;
        let half_width = PI * self.scale;
        let half_height = PI / 2.0 * self.scale;
        (
            cx - half_width,
            cy - half_height,
            cx + half_width,
            cy + half_height,
        )
    }
}

impl Projection for Equirectangular {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let dlon = floor_mod(lon - self.lon0 + 180.0, 360.0) - 180.0;
        Some((
            self.translate.0 + self.scale * dlon.to_radians(),
            self.translate.1 - self.scale * lat.to_radians(),
        ))
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lambda = (x - self.translate.0) / self.scale;
        let phi = (self.translate.1 - y) / self.scale;
        if !lambda.is_finite() || !phi.is_finite() || lambda.abs() > PI || phi.abs() > PI / 2.0 {
            return None;
        }
        Some((self.lon0 + lambda.to_degrees(), phi.to_degrees()))
    }
}

impl Globe for Equirectangular {
    fn projection(&self) -> &dyn Projection {
        self
    }

    fn bounds(&self, view: View) -> Bounds {
        let (x0, y0, x1, y1) = self.corners();
        Bounds::clamped(x0, y0, x1, y1, view)
    }

    fn mask_outline(&self, _view: View) -> MaskOutline {
        let (x0, y0, x1, y1) = self.corners();
        MaskOutline::Polygon(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }
}
