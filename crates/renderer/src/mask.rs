//! Visibility mask for a globe.
//!
//! The mask is an RGBA raster the size of the view. The globe outline is filled opaque
//! without anti-aliasing, so a pixel is visible exactly when its alpha is non-zero. The
//! field builder later overwrites visible pixels with overlay colors, and the mask then
//! doubles as the overlay image.

use flow_common::{FlowError, FlowResult, Rgba, View};
use projection::MaskOutline;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// Straight-alpha RGBA raster, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Mask {
    /// Rasterize `outline` into a new mask sized to `view`.
    pub fn rasterize(outline: &MaskOutline, view: View) -> FlowResult<Self> {
        let mut pixmap = Pixmap::new(view.width as u32, view.height as u32).ok_or_else(|| {
            FlowError::Mask(format!(
                "cannot allocate {}x{} raster",
                view.width, view.height
            ))
        })?;

        let path = match outline {
            MaskOutline::Circle { cx, cy, r } => {
                PathBuilder::from_circle(*cx as f32, *cy as f32, *r as f32)
            }
            MaskOutline::Polygon(points) => {
                let mut pb = PathBuilder::new();
                let mut points = points.iter();
                if let Some(&(x, y)) = points.next() {
                    pb.move_to(x as f32, y as f32);
                }
                for &(x, y) in points {
                    pb.line_to(x as f32, y as f32);
                }
                pb.close();
                pb.finish()
            }
        };

        // A degenerate outline leaves every pixel invisible
        if let Some(path) = path {
            let mut paint = Paint::default();
            paint.set_color_rgba8(255, 0, 0, 255);
            paint.anti_alias = false;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        // The fill is opaque, so premultiplied and straight bytes coincide
        let mask = Self {
            width: view.width,
            height: view.height,
            data: pixmap.take(),
        };
        tracing::debug!(
            width = view.width,
            height = view.height,
            visible = mask.visible_count(),
            "Rasterized globe mask"
        );
        Ok(mask)
    }

    /// A mask with every pixel visible.
    pub fn opaque(view: View) -> Self {
        Self {
            width: view.width,
            height: view.height,
            data: [255u8, 0, 0, 255].repeat(view.area()),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) * 4)
    }

    /// True when `(x, y)` is inside the view and has non-zero alpha.
    pub fn is_visible(&self, x: usize, y: usize) -> bool {
        self.offset(x, y).is_some_and(|i| self.data[i + 3] > 0)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        self.offset(x, y).map(|i| {
            Rgba::new(
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            )
        })
    }

    /// Overwrite a pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&color.to_array());
        }
    }

    /// Number of pixels with non-zero alpha.
    pub fn visible_count(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] > 0).count()
    }
}
