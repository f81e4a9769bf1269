//! Raster surfaces for particle trails and overlays.

use flow_common::{Bounds, FlowError, FlowResult, Rgba, View};
use tiny_skia::{
    BlendMode, Color, ColorU8, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::mask::Mask;

/// A line segment `(x0, y0) -> (x1, y1)` in pixels.
pub type Segment = (f64, f64, f64, f64);

/// An RGBA drawing surface sized to the view.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(view: View) -> FlowResult<Self> {
        let pixmap = Pixmap::new(view.width as u32, view.height as u32).ok_or_else(|| {
            FlowError::Render(format!(
                "cannot allocate {}x{} canvas",
                view.width, view.height
            ))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Scale the alpha of every pixel inside `bounds` by `alpha` (destination-in).
    ///
    /// Called once per frame so older trail segments fade out.
    pub fn fade(&mut self, bounds: &Bounds, alpha: f32) {
        let Some(rect) = Rect::from_xywh(
            bounds.x as f32,
            bounds.y as f32,
            bounds.width as f32,
            bounds.height as f32,
        ) else {
            return;
        };
        let mut paint = Paint::default();
        let color = Color::from_rgba(0.0, 0.0, 0.0, alpha.clamp(0.0, 1.0)).unwrap_or(Color::BLACK);
        paint.set_color(color);
        paint.blend_mode = BlendMode::DestinationIn;
        paint.anti_alias = false;
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Paint a 1x1 pixel at each point, rounded to the nearest pixel. Points off the
    /// canvas are skipped.
    pub fn plot_points(&mut self, color: Rgba, points: &[(f64, f64)]) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = false;
        for &(x, y) in points {
            let Some(rect) = Rect::from_xywh(x.round() as f32, y.round() as f32, 1.0, 1.0) else {
                continue;
            };
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    /// Stroke all `segments` as one path in a single color.
    pub fn stroke_segments(&mut self, color: Rgba, line_width: f32, segments: &[Segment]) {
        if segments.is_empty() {
            return;
        }
        let mut pb = PathBuilder::new();
        for &(x0, y0, x1, y1) in segments {
            pb.move_to(x0 as f32, y0 as f32);
            pb.line_to(x1 as f32, y1 as f32);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Replace the canvas contents with the mask's pixels.
    pub fn put_mask(&mut self, mask: &Mask) -> FlowResult<()> {
        if mask.width() != self.width() || mask.height() != self.height() {
            return Err(FlowError::Render(format!(
                "mask {}x{} does not match canvas {}x{}",
                mask.width(),
                mask.height(),
                self.width(),
                self.height()
            )));
        }
        for (dst, src) in self
            .pixmap
            .pixels_mut()
            .iter_mut()
            .zip(mask.data().chunks_exact(4))
        {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(())
    }

    /// Draw `other` over this canvas (source-over).
    pub fn draw_canvas(&mut self, other: &Canvas) {
        self.pixmap.draw_pixmap(
            0,
            0,
            other.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Straight-alpha color of a pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        let p = self.pixmap.pixel(x as u32, y as u32)?.demultiply();
        Some(Rgba::new(p.red(), p.green(), p.blue(), p.alpha()))
    }

    /// Straight-alpha RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_count(&self) -> usize {
        self.pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_canvas(view: View) -> Canvas {
        let mut canvas = Canvas::new(view).unwrap();
        canvas.pixmap.fill(Color::WHITE);
        canvas
    }

    #[test]
    fn test_fade_only_inside_bounds() {
        let mut canvas = white_canvas(View::new(4, 4));
        canvas.fade(&Bounds::new(0, 0, 1, 3), 0.5);

        let faded = canvas.pixel(0, 0).unwrap();
        assert!(faded.a > 120 && faded.a < 135, "alpha {}", faded.a);
        assert_eq!(canvas.pixel(3, 3).unwrap().a, 255);
    }

    #[test]
    fn test_repeated_fade_decays() {
        let mut canvas = white_canvas(View::new(2, 2));
        let bounds = Bounds::new(0, 0, 1, 1);
        for _ in 0..40 {
            canvas.fade(&bounds, 0.9);
        }
        assert!(canvas.pixel(1, 1).unwrap().a < 10);
    }

    #[test]
    fn test_stroke_paints_pixels() {
        let mut canvas = Canvas::new(View::new(20, 20)).unwrap();
        assert_eq!(canvas.painted_count(), 0);
        canvas.stroke_segments(
            Rgba::new(255, 255, 255, 255),
            1.0,
            &[(2.0, 10.5, 18.0, 10.5)],
        );
        assert!(canvas.painted_count() >= 16);
        canvas.clear();
        assert_eq!(canvas.painted_count(), 0);
    }

    #[test]
    fn test_plot_points_rounds_and_clips() {
        let mut canvas = Canvas::new(View::new(4, 4)).unwrap();
        let white = Rgba::new(255, 255, 255, 255);
        canvas.plot_points(white, &[(1.4, 2.6), (-3.0, 1.0), (9.0, 9.0)]);

        assert_eq!(canvas.pixel(1, 3), Some(white));
        assert_eq!(canvas.painted_count(), 1);
    }

    #[test]
    fn test_put_mask_round_trips_colors() {
        let view = View::new(3, 3);
        let mut mask = Mask::opaque(view);
        mask.set(1, 1, Rgba::new(200, 100, 50, 255));
        mask.set(0, 0, Rgba::TRANSPARENT);

        let mut canvas = Canvas::new(view).unwrap();
        canvas.put_mask(&mask).unwrap();
        assert_eq!(canvas.pixel(1, 1), Some(Rgba::new(200, 100, 50, 255)));
        assert_eq!(canvas.pixel(0, 0).unwrap().a, 0);
        assert_eq!(canvas.painted_count(), 8);
    }

    #[test]
    fn test_put_mask_size_mismatch() {
        let mask = Mask::opaque(View::new(2, 2));
        let mut canvas = Canvas::new(View::new(3, 3)).unwrap();
        assert!(canvas.put_mask(&mask).is_err());
    }
}
