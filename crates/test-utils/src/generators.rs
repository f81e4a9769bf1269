//! Test data generators for synthetic wind and scalar grids.
//!
//! These generators create predictable, verifiable data on a regular lattice
//! that can be used across the test suite.

use std::sync::Arc;

use flow_common::{GridData, GridSpec, ParticleTuning, RegularGrid};

use crate::fixtures::{fixture_date, GrayScale};

/// Creates temperature-like values in Kelvin.
///
/// Warmest at the equator (about 300 K), coldest at the poles (about 240 K).
fn create_temperature_values(spec: &GridSpec) -> Vec<f32> {
    let mut data = Vec::with_capacity(spec.len());
    for row in 0..spec.ny {
        let lat = spec.la1 - row as f64 * spec.dy;
        let t = 240.0 + 60.0 * lat.to_radians().cos();
        data.extend(std::iter::repeat(t as f32).take(spec.nx));
    }
    data
}

/// Creates U/V components of a banded zonal flow.
///
/// Easterlies in the tropics, westerlies at mid latitudes, and a weak
/// meridional component varying with longitude.
fn create_zonal_wind(spec: &GridSpec) -> (Vec<f32>, Vec<f32>) {
    let mut u = Vec::with_capacity(spec.len());
    let mut v = Vec::with_capacity(spec.len());
    for row in 0..spec.ny {
        let lat = (spec.la1 - row as f64 * spec.dy).to_radians();
        for col in 0..spec.nx {
            let lon = (spec.lo1 + col as f64 * spec.dx).to_radians();
            u.push((-10.0 * (3.0 * lat).cos()) as f32);
            v.push((3.0 * lon.sin() * lat.cos()) as f32);
        }
    }
    (u, v)
}

/// A regular wind grid built from [`create_zonal_wind`] with default particle tuning.
pub fn zonal_wind_grid(spec: GridSpec) -> RegularGrid {
    let (u, v) = create_zonal_wind(&spec);
    RegularGrid::new(
        "zonal wind",
        fixture_date(),
        spec,
        GridData::Vector { u, v },
        Arc::new(GrayScale),
    )
    .expect("generated wind matches its lattice")
    .with_particles(ParticleTuning::default())
}

/// A regular temperature grid built from [`create_temperature_values`].
pub fn temperature_grid(spec: GridSpec) -> RegularGrid {
    RegularGrid::new(
        "temperature",
        fixture_date(),
        spec,
        GridData::Scalar(create_temperature_values(&spec)),
        Arc::new(GrayScale),
    )
    .expect("generated temperatures match their lattice")
}
