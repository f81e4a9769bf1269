//! Orthographic projection.
//!
//! The earth is seen from infinitely far away, centered on a chosen point. Only the
//! hemisphere facing the viewer is visible, so the projected earth is a disc.

use flow_common::{Bounds, View};
use nalgebra::{Rotation3, Vector3};

use crate::{Globe, MaskOutline, Projection};

/// Orthographic globe.
#[derive(Debug, Clone)]
pub struct Orthographic {
    /// Disc radius in pixels
    pub scale: f64,
    /// Screen position of the center point
    pub translate: (f64, f64),
    /// Rotates earth-fixed unit vectors so the center point faces the viewer (+x)
    rotation: Rotation3<f64>,
}

impl Orthographic {
    /// Create a projection centered on `(lon0, lat0)` in degrees.
    ///
    /// # Arguments
    /// * `lon0` - Longitude shown at the disc center (degrees)
    /// * `lat0` - Latitude shown at the disc center (degrees)
    /// * `scale` - Disc radius in pixels
    /// * `translate` - Screen position of the disc center
    pub fn new(lon0: f64, lat0: f64, scale: f64, translate: (f64, f64)) -> Self {
        let spin = Rotation3::from_axis_angle(&Vector3::z_axis(), -lon0.to_radians());
        let tilt = Rotation3::from_axis_angle(&Vector3::y_axis(), lat0.to_radians());
        Self {
            scale,
            translate,
            rotation: tilt * spin,
        }
    }

    /// Center the disc in `view` with a small margin.
    pub fn fit(view: View, lon0: f64, lat0: f64) -> Self {
        let scale = (view.width.min(view.height) as f64 / 2.0 * 0.9).floor();
        let translate = (view.width as f64 / 2.0, view.height as f64 / 2.0);
        Self::new(lon0, lat0, scale, translate)
    }
}

fn to_unit(lon: f64, lat: f64) -> Vector3<f64> {
    let (lambda, phi) = (lon.to_radians(), lat.to_radians());
    Vector3::new(phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin())
}

impl Projection for Orthographic {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let p = self.rotation * to_unit(lon, lat);
        // Back hemisphere
        if p.x < 0.0 {
            return None;
        }
        Some((
            self.translate.0 + self.scale * p.y,
            self.translate.1 - self.scale * p.z,
        ))
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let py = (x - self.translate.0) / self.scale;
        let pz = (self.translate.1 - y) / self.scale;
        let rho2 = py * py + pz * pz;
        if !rho2.is_finite() || rho2 > 1.0 {
            return None;
        }
        let p = self.rotation.inverse() * Vector3::new((1.0 - rho2).sqrt(), py, pz);
        let lon = p.y.atan2(p.x).to_degrees();
        let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
        Some((lon, lat))
    }
}

impl Globe for Orthographic {
    fn projection(&self) -> &dyn Projection {
        self
    }

    fn bounds(&self, view: View) -> Bounds {
        let (cx, cy) = self.translate;
        Bounds::clamped(
            cx - self.scale,
            cy - self.scale,
            cx + self.scale,
            cy + self.scale,
            view,
        )
    }

    fn mask_outline(&self, _view: View) -> MaskOutline {
        MaskOutline::Circle {
            cx: self.translate.0,
            cy: self.translate.1,
            r: self.scale,
        }
    }
}
