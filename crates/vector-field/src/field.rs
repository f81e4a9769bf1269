//! Per-pixel field lookup.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use flow_common::{Bounds, Wind};
use rand::Rng;
use renderer::Mask;

/// Extra draws [`Field::randomize`] makes after the first before giving up.
pub const RANDOMIZE_RETRIES: usize = 30;

/// What the field holds at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FieldSample {
    /// Outside the globe's outer boundary.
    #[default]
    Missing,
    /// Inside the boundary, but without data.
    Hole,
    /// Screen displacement per frame; the magnitude is in data units.
    Vector(Wind),
}

impl FieldSample {
    pub fn is_defined(&self) -> bool {
        matches!(self, FieldSample::Vector(_))
    }

    pub fn is_inside_boundary(&self) -> bool {
        !matches!(self, FieldSample::Missing)
    }

    pub fn wind(&self) -> Option<Wind> {
        match self {
            FieldSample::Vector(wind) => Some(*wind),
            _ => None,
        }
    }
}

/// Field samples for the pixels inside `bounds`, plus the colored overlay mask.
///
/// Immutable once built, except that [`release`](Field::release) drops the samples
/// when the animation that used the field ends.
pub struct Field {
    bounds: Bounds,
    /// One column per x in `bounds`, each holding one sample per y in `bounds`.
    columns: RwLock<Vec<Vec<FieldSample>>>,
    overlay: Mask,
    defined: usize,
}

impl Field {
    /// Wrap precomputed columns. Columns shorter than `bounds.height` read as missing.
    pub fn new(bounds: Bounds, columns: Vec<Vec<FieldSample>>, overlay: Mask) -> Self {
        let defined = columns
            .iter()
            .flatten()
            .filter(|sample| sample.is_defined())
            .count();
        Self {
            bounds,
            columns: RwLock::new(columns),
            overlay,
            defined,
        }
    }

    /// Build a field by evaluating `sample` at every pixel inside `bounds`.
    pub fn from_fn<F>(bounds: Bounds, overlay: Mask, mut sample: F) -> Self
    where
        F: FnMut(usize, usize) -> FieldSample,
    {
        let columns = (bounds.x..=bounds.x_max)
            .map(|x| (bounds.y..=bounds.y_max).map(|y| sample(x, y)).collect())
            .collect();
        Self::new(bounds, columns, overlay)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The globe mask, colored by overlay value wherever the field was sampled.
    pub fn overlay(&self) -> &Mask {
        &self.overlay
    }

    /// Sample at the pixel nearest `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> FieldSample {
        let (Some(x), Some(y)) = (pixel(x), pixel(y)) else {
            return FieldSample::Missing;
        };
        if x < self.bounds.x || y < self.bounds.y {
            return FieldSample::Missing;
        }
        self.columns()
            .get(x - self.bounds.x)
            .and_then(|column| column.get(y - self.bounds.y))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_defined(&self, x: f64, y: f64) -> bool {
        self.sample(x, y).is_defined()
    }

    pub fn is_inside_boundary(&self, x: f64, y: f64) -> bool {
        self.sample(x, y).is_inside_boundary()
    }

    /// A random pixel inside the bounds, preferably one with a defined sample.
    ///
    /// Draws up to `1 + RANDOMIZE_RETRIES` points and returns the last one drawn,
    /// which may be undefined.
    pub fn randomize<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        let b = self.bounds;
        let mut point = (0.0, 0.0);
        for _ in 0..=RANDOMIZE_RETRIES {
            point = (
                rng.gen_range(b.x..=b.x_max) as f64,
                rng.gen_range(b.y..=b.y_max) as f64,
            );
            if self.is_defined(point.0, point.1) {
                break;
            }
        }
        point
    }

    /// Drop the samples. Every later lookup sees [`FieldSample::Missing`].
    pub fn release(&self) {
        let mut columns = self.columns.write().unwrap_or_else(PoisonError::into_inner);
        columns.clear();
        columns.shrink_to_fit();
    }

    pub fn is_released(&self) -> bool {
        self.columns().is_empty()
    }

    /// Number of pixels holding a vector, or 0 once released.
    pub fn defined_count(&self) -> usize {
        if self.is_released() {
            0
        } else {
            self.defined
        }
    }

    fn columns(&self) -> RwLockReadGuard<'_, Vec<Vec<FieldSample>>> {
        self.columns.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("bounds", &self.bounds)
            .field("defined", &self.defined_count())
            .finish()
    }
}

/// Nearest pixel index, rounding halves up.
fn pixel(v: f64) -> Option<usize> {
    let rounded = (v + 0.5).floor();
    (rounded.is_finite() && rounded >= 0.0).then_some(rounded as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_common::View;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn half_defined(view: View) -> Field {
        Field::from_fn(Bounds::of_view(view), Mask::opaque(view), |x, _| {
            if x >= view.width / 2 {
                FieldSample::Vector(Wind::new(1.0, 0.0))
            } else {
                FieldSample::Hole
            }
        })
    }

    #[test]
    fn test_sample_rounds_to_nearest_pixel() {
        let field = half_defined(View::new(8, 8));
        assert!(field.is_defined(3.5, 0.0));
        assert!(!field.is_defined(3.49, 0.0));
        assert!(field.is_inside_boundary(0.0, 0.0));
    }

    #[test]
    fn test_outside_bounds_is_missing() {
        let field = half_defined(View::new(8, 8));
        assert_eq!(field.sample(-1.0, 2.0), FieldSample::Missing);
        assert_eq!(field.sample(8.0, 2.0), FieldSample::Missing);
        assert_eq!(field.sample(2.0, f64::NAN), FieldSample::Missing);
    }

    #[test]
    fn test_offset_bounds() {
        let view = View::new(10, 10);
        let bounds = Bounds::new(4, 4, 5, 5);
        let field = Field::from_fn(bounds, Mask::opaque(view), |_, _| FieldSample::Hole);
        assert!(!field.is_inside_boundary(3.0, 4.0));
        assert!(field.is_inside_boundary(5.0, 5.0));
        assert_eq!(field.defined_count(), 0);
    }

    #[test]
    fn test_randomize_finds_defined_point() {
        let field = half_defined(View::new(8, 8));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let (x, y) = field.randomize(&mut rng);
            assert!(field.is_defined(x, y), "({}, {}) undefined", x, y);
        }
    }

    #[test]
    fn test_randomize_without_defined_points_stays_in_bounds() {
        let view = View::new(10, 10);
        let bounds = Bounds::new(2, 3, 6, 7);
        let field = Field::from_fn(bounds, Mask::opaque(view), |_, _| FieldSample::Hole);
        let mut rng = StdRng::seed_from_u64(1);
        let (x, y) = field.randomize(&mut rng);
        assert!(bounds.contains(x, y));
        assert_eq!(x.fract(), 0.0);
    }

    #[test]
    fn test_release_makes_everything_missing() {
        let field = half_defined(View::new(4, 4));
        assert_eq!(field.defined_count(), 8);
        field.release();
        assert!(field.is_released());
        assert_eq!(field.sample(3.0, 3.0), FieldSample::Missing);
        assert_eq!(field.defined_count(), 0);
        // Releasing twice is harmless
        field.release();
    }
}
