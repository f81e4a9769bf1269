//! Color scales mapping data values to colors.

use flow_common::math::{proportion, spread};
use flow_common::{ColorScale, Rgba};

const TAU: f64 = std::f64::consts::TAU;

/// Point in `[0, 1]` where the extended sinebow stops rotating hue and fades to white.
const SINEBOW_BOUNDARY: f64 = 0.45;

/// Lightest and darkest gray used for particle trails.
const INTENSITY_LOW: u16 = 85;
const INTENSITY_HIGH: u16 = 255;

/// Color along a trefoil rainbow for `hue` in `[0, 1]`.
///
/// Hue covers 5/6 of a rotation so that 0 and 1 do not map to the same color.
pub fn sinebow_color(hue: f64, alpha: u8) -> Rgba {
    let rad = hue * TAU * 5.0 / 6.0 * 0.75;
    let (s, c) = rad.sin_cos();
    Rgba::new(
        channel((-c).max(0.0)),
        channel(s.max(0.0)),
        channel(c.max(0.0).max(-s)),
        alpha,
    )
}

/// Sinebow up to `i = 0.45`, then a linear fade to white.
pub fn extended_sinebow_color(i: f64, alpha: u8) -> Rgba {
    if i <= SINEBOW_BOUNDARY {
        sinebow_color(i / SINEBOW_BOUNDARY, alpha)
    } else {
        let start = sinebow_color(1.0, 0);
        interpolate_color(
            start,
            Rgba::new(255, 255, 255, 0),
            (i - SINEBOW_BOUNDARY) / (1.0 - SINEBOW_BOUNDARY),
            alpha,
        )
    }
}

/// Linear interpolation between two colors, flooring each channel.
///
/// `t` is not clamped; callers pass a proportion.
pub fn interpolate_color(start: Rgba, end: Rgba, t: f64, alpha: u8) -> Rgba {
    let mix = |a: u8, b: u8| (a as f64 + t * (b as f64 - a as f64)).floor().clamp(0.0, 255.0) as u8;
    Rgba::new(
        mix(start.r, end.r),
        mix(start.g, end.g),
        mix(start.b, end.b),
        alpha,
    )
}

fn channel(value: f64) -> u8 {
    (value * 255.0).floor().clamp(0.0, 255.0) as u8
}

/// Sinebow scale stretched over `[low, high]`.
#[derive(Debug, Clone, Copy)]
pub struct SinebowScale {
    pub low: f64,
    pub high: f64,
    /// Fade to white past the boundary instead of completing the hue rotation
    pub extended: bool,
}

impl SinebowScale {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            extended: false,
        }
    }

    pub fn extended(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            extended: true,
        }
    }
}

impl ColorScale for SinebowScale {
    fn gradient(&self, value: f64, alpha: u8) -> Rgba {
        let p = proportion(value, self.low, self.high);
        if self.extended {
            extended_sinebow_color(p, alpha)
        } else {
            sinebow_color(p, alpha)
        }
    }

    fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

/// Piecewise-linear scale through `(value, color)` segments sorted by value.
#[derive(Debug, Clone)]
pub struct SegmentedScale {
    segments: Vec<(f64, Rgba)>,
}

impl SegmentedScale {
    /// Create a scale from at least two segments. Segments are sorted by value.
    pub fn new(mut segments: Vec<(f64, Rgba)>) -> Option<Self> {
        if segments.len() < 2 || segments.iter().any(|(value, _)| !value.is_finite()) {
            return None;
        }
        segments.sort_by(|a, b| a.0.total_cmp(&b.0));
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[(f64, Rgba)] {
        &self.segments
    }
}

impl ColorScale for SegmentedScale {
    fn gradient(&self, value: f64, alpha: u8) -> Rgba {
        // Index of the segment whose upper end first reaches the value; the last
        // segment absorbs everything above.
        let last = self.segments.len() - 2;
        let i = (0..last)
            .find(|&i| value <= self.segments[i + 1].0)
            .unwrap_or(last);
        let (low, start) = self.segments[i];
        let (high, end) = self.segments[i + 1];
        interpolate_color(start, end, proportion(value, low, high), alpha)
    }

    fn bounds(&self) -> (f64, f64) {
        (self.segments[0].0, self.segments[self.segments.len() - 1].0)
    }
}

/// Gray styles for particle trails, brighter for faster flow.
#[derive(Debug, Clone)]
pub struct WindIntensityScale {
    styles: Vec<Rgba>,
    max_intensity: f64,
}

impl WindIntensityScale {
    /// Grays from 85 to 255 stepping by `step`.
    pub fn new(step: u16, max_intensity: f64) -> Self {
        let styles = (INTENSITY_LOW..=INTENSITY_HIGH)
            .step_by(step.max(1) as usize)
            .map(|j| Rgba::new(j as u8, j as u8, j as u8, 255))
            .collect();
        Self {
            styles,
            max_intensity,
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn styles(&self) -> &[Rgba] {
        &self.styles
    }

    /// Style index for a magnitude, saturating at `max_intensity`.
    pub fn index_for(&self, magnitude: f64) -> usize {
        if !(self.max_intensity > 0.0) || !magnitude.is_finite() {
            return 0;
        }
        let ratio = magnitude.max(0.0).min(self.max_intensity) / self.max_intensity;
        (ratio * (self.styles.len() - 1) as f64).floor() as usize
    }
}

/// Sample `scale` at `n` evenly spaced values across its bounds.
pub fn sample_scale(scale: &dyn ColorScale, n: usize, alpha: u8) -> Vec<Rgba> {
    let (low, high) = scale.bounds();
    let denominator = n.saturating_sub(1).max(1) as f64;
    (0..n)
        .map(|i| scale.gradient(spread(i as f64 / denominator, low, high), alpha))
        .collect()
}
