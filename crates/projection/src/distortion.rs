//! Local distortion of a projection.
//!
//! A geographic vector `(u, v)` (eastward, northward) has to be turned into a screen
//! displacement. Near a point the projection is approximately linear, so its Jacobian,
//! estimated by finite differences, maps one onto the other.

use flow_common::Wind;
use nalgebra::{Matrix2, Vector2};

use crate::Projection;

/// Finite-difference step in degrees (about 4 m at the equator).
pub const DISTORTION_STEP: f64 = 0.0000360;

/// Jacobian of `projection` at `(lon, lat)`, which projects to `(x, y)`.
///
/// The columns are `(dx/dλ, dy/dλ)` and `(dx/dφ, dy/dφ)`. The λ column is divided by
/// `cos φ` so that a unit eastward vector has the same length as a unit northward one.
/// Steps point toward the interior of the coordinate range so that the offset point
/// stays valid at the antimeridian and the poles.
///
/// Returns `None` when an offset point cannot be projected.
pub fn distortion(
    projection: &dyn Projection,
    lon: f64,
    lat: f64,
    x: f64,
    y: f64,
) -> Option<Matrix2<f64>> {
    let h_lambda = if lon < 0.0 {
        DISTORTION_STEP
    } else {
        -DISTORTION_STEP
    };
    let h_phi = if lat < 0.0 {
        DISTORTION_STEP
    } else {
        -DISTORTION_STEP
    };

    let (lx, ly) = projection.project(lon + h_lambda, lat)?;
    let (px, py) = projection.project(lon, lat + h_phi)?;

    let k = lat.to_radians().cos();
    Some(Matrix2::new(
        (lx - x) / h_lambda / k,
        (px - x) / h_phi,
        (ly - y) / h_lambda / k,
        (py - y) / h_phi,
    ))
}

/// Convert `wind` at `(lon, lat)` into a screen displacement scaled by `scale`.
///
/// The magnitude of the result is carried over from `wind` unchanged.
pub fn distort(
    projection: &dyn Projection,
    lon: f64,
    lat: f64,
    x: f64,
    y: f64,
    scale: f64,
    wind: Wind,
) -> Option<Wind> {
    let d = distortion(projection, lon, lat, x, y)?;
    let screen = d * Vector2::new(wind.u * scale, wind.v * scale);
    let distorted = Wind::with_magnitude(screen.x, screen.y, wind.magnitude);
    distorted.is_finite().then_some(distorted)
}
