//! Screen-space view and bounds types.

use serde::{Deserialize, Serialize};

use crate::{FlowError, FlowResult};

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub width: usize,
    pub height: usize,
}

impl View {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels in the view.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl Default for View {
    fn default() -> Self {
        Self {
            width: 960,
            height: 640,
        }
    }
}

/// Pixel bounds of a globe on screen.
///
/// `x_max` and `y_max` are inclusive, so `width = x_max - x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: usize,
    pub y: usize,
    pub x_max: usize,
    pub y_max: usize,
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    /// Create bounds from inclusive corner pixels.
    pub fn new(x: usize, y: usize, x_max: usize, y_max: usize) -> Self {
        Self {
            x,
            y,
            x_max,
            y_max,
            width: (x_max + 1).saturating_sub(x),
            height: (y_max + 1).saturating_sub(y),
        }
    }

    /// Bounds covering the whole view.
    pub fn of_view(view: View) -> Self {
        Self::new(
            0,
            0,
            view.width.saturating_sub(1),
            view.height.saturating_sub(1),
        )
    }

    /// Clamp a projected extent `[min_x, min_y] - [max_x, max_y]` to the view.
    ///
    /// The upper-left corner is floored, the lower-right corner is ceiled, and both are
    /// kept inside `[0, view - 1]`.
    pub fn clamped(min_x: f64, min_y: f64, max_x: f64, max_y: f64, view: View) -> Self {
        let last_x = view.width.saturating_sub(1) as f64;
        let last_y = view.height.saturating_sub(1) as f64;
        let x = min_x.floor().clamp(0.0, last_x) as usize;
        let y = min_y.floor().clamp(0.0, last_y) as usize;
        let x_max = max_x.ceil().clamp(0.0, last_x) as usize;
        let y_max = max_y.ceil().clamp(0.0, last_y) as usize;
        Self::new(x, y, x_max, y_max)
    }

    /// Check if a pixel lies within these bounds.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x as f64 && x <= self.x_max as f64 && y >= self.y as f64 && y <= self.y_max as f64
    }

    /// Check that these bounds are non-empty and fit inside the view.
    pub fn validate(&self, view: View) -> FlowResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FlowError::InvalidBounds(format!(
                "empty bounds {}x{}",
                self.width, self.height
            )));
        }
        if self.x_max >= view.width || self.y_max >= view.height {
            return Err(FlowError::InvalidBounds(format!(
                "bounds ({}, {})-({}, {}) exceed view {}x{}",
                self.x, self.y, self.x_max, self.y_max, view.width, view.height
            )));
        }
        Ok(())
    }
}
