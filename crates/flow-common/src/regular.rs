//! Regular lon/lat lattice grid with bilinear interpolation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::ColorScale;
use crate::grid::{Grid, GridValue, ParticleTuning, Wind};
use crate::math::floor_mod;
use crate::{FlowError, FlowResult};

/// Geometry of a regular lat/lon grid.
///
/// Rows start at `la1` and run southward in steps of `dy`; columns start at `lo1` and run
/// eastward in steps of `dx`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub nx: usize,
    pub ny: usize,
    pub lo1: f64,
    pub la1: f64,
    pub dx: f64,
    pub dy: f64,
}

impl GridSpec {
    /// Standard 1° global grid starting at 0°E, 90°N.
    pub fn global_one_degree() -> Self {
        Self {
            nx: 360,
            ny: 181,
            lo1: 0.0,
            la1: 90.0,
            dx: 1.0,
            dy: 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the columns cover the full circle, so the last column neighbors the first.
    pub fn wraps(&self) -> bool {
        (self.nx as f64 * self.dx).floor() >= 360.0
    }

    fn validate(&self) -> FlowResult<()> {
        if self.nx < 2 || self.ny < 2 {
            return Err(FlowError::InvalidGrid(format!(
                "grid must be at least 2x2, got {}x{}",
                self.nx, self.ny
            )));
        }
        if !(self.dx > 0.0 && self.dy > 0.0) {
            return Err(FlowError::InvalidGrid(format!(
                "grid spacing must be positive, got dx={} dy={}",
                self.dx, self.dy
            )));
        }
        Ok(())
    }
}

/// Values stored row-major, `NaN` marking missing points.
#[derive(Debug, Clone)]
pub enum GridData {
    Scalar(Vec<f32>),
    Vector { u: Vec<f32>, v: Vec<f32> },
}

/// A `Grid` backed by a regular lattice.
pub struct RegularGrid {
    name: String,
    date: DateTime<Utc>,
    spec: GridSpec,
    data: GridData,
    scale: Arc<dyn ColorScale>,
    particles: Option<ParticleTuning>,
}

impl RegularGrid {
    pub fn new(
        name: impl Into<String>,
        date: DateTime<Utc>,
        spec: GridSpec,
        data: GridData,
        scale: Arc<dyn ColorScale>,
    ) -> FlowResult<Self> {
        spec.validate()?;
        let lengths = match &data {
            GridData::Scalar(values) => vec![values.len()],
            GridData::Vector { u, v } => vec![u.len(), v.len()],
        };
        if lengths.iter().any(|&len| len != spec.len()) {
            return Err(FlowError::InvalidGrid(format!(
                "expected {} values, got {:?}",
                spec.len(),
                lengths
            )));
        }
        Ok(Self {
            name: name.into(),
            date,
            spec,
            data,
            scale,
            particles: None,
        })
    }

    /// Attach particle parameters. Only meaningful for vector grids.
    pub fn with_particles(mut self, particles: ParticleTuning) -> Self {
        self.particles = Some(particles);
        self
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.data, GridData::Vector { .. })
    }

    /// Every lattice point as `(lon, lat, value)`, row by row from `la1`. The value is
    /// `None` where the point is missing.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, Option<GridValue>)> + '_ {
        let spec = self.spec;
        (0..spec.len()).map(move |k| {
            let (row, col) = (k / spec.nx, k % spec.nx);
            let lon = spec.lo1 + col as f64 * spec.dx;
            let lat = spec.la1 - row as f64 * spec.dy;
            (lon, lat, self.value_at(k))
        })
    }

    fn value_at(&self, k: usize) -> Option<GridValue> {
        match &self.data {
            GridData::Scalar(values) => {
                let value = values[k];
                (!value.is_nan()).then(|| GridValue::Scalar(value as f64))
            }
            GridData::Vector { u, v } => {
                let (u, v) = (u[k], v[k]);
                (!u.is_nan() && !v.is_nan())
                    .then(|| GridValue::Vector(Wind::new(u as f64, v as f64)))
            }
        }
    }

    /// Fractional column/row of a coordinate, or `None` outside the lattice.
    fn locate(&self, lon: f64, lat: f64) -> Option<Corners> {
        let spec = &self.spec;
        let i = floor_mod(lon - spec.lo1, 360.0) / spec.dx;
        let j = (spec.la1 - lat) / spec.dy;
        if !i.is_finite() || !j.is_finite() || j < 0.0 {
            return None;
        }

        let fi = i.floor() as usize;
        let fj = j.floor() as usize;
        let mut ci = fi + 1;
        let cj = (fj + 1).min(spec.ny - 1);
        if fj >= spec.ny {
            return None;
        }
        if ci >= spec.nx {
            if spec.wraps() {
                ci %= spec.nx;
            } else if fi == spec.nx - 1 && i == fi as f64 {
                ci = fi;
            } else {
                return None;
            }
        }
        if fi >= spec.nx {
            return None;
        }

        Some(Corners {
            i00: fj * spec.nx + fi,
            i10: fj * spec.nx + ci,
            i01: cj * spec.nx + fi,
            i11: cj * spec.nx + ci,
            xf: (i - fi as f64) as f32,
            yf: (j - fj as f64) as f32,
        })
    }
}

struct Corners {
    i00: usize,
    i10: usize,
    i01: usize,
    i11: usize,
    xf: f32,
    yf: f32,
}

impl Corners {
    fn bilinear(&self, data: &[f32]) -> Option<f64> {
        let v00 = data[self.i00];
        let v10 = data[self.i10];
        let v01 = data[self.i01];
        let v11 = data[self.i11];

        // Any missing corner makes the whole cell missing
        if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
            return None;
        }

        let top = v00 * (1.0 - self.xf) + v10 * self.xf;
        let bottom = v01 * (1.0 - self.xf) + v11 * self.xf;
        Some((top * (1.0 - self.yf) + bottom * self.yf) as f64)
    }
}

impl Grid for RegularGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    fn interpolate(&self, lon: f64, lat: f64) -> Option<GridValue> {
        let corners = self.locate(lon, lat)?;
        match &self.data {
            GridData::Scalar(values) => corners.bilinear(values).map(GridValue::Scalar),
            GridData::Vector { u, v } => {
                let u = corners.bilinear(u)?;
                let v = corners.bilinear(v)?;
                Some(GridValue::Vector(Wind::new(u, v)))
            }
        }
    }

    fn scale(&self) -> &dyn ColorScale {
        self.scale.as_ref()
    }

    fn particles(&self) -> Option<ParticleTuning> {
        self.particles
    }

    fn lattice_points(&self) -> Vec<(f64, f64)> {
        self.points()
            .filter(|(_, _, value)| value.is_some())
            .map(|(lon, lat, _)| (lon, lat))
            .collect()
    }
}

impl std::fmt::Debug for RegularGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegularGrid")
            .field("name", &self.name)
            .field("date", &self.date)
            .field("spec", &self.spec)
            .field("vector", &self.is_vector())
            .finish()
    }
}
