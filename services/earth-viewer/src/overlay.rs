//! Overlay drawing, the color bar and location probing.

use std::sync::Arc;

use flow_common::{ColorScale, FlowResult, Grid, GridPair, GridValue, Rgba, View};
use projection::Globe;
use renderer::gradient::sample_scale;
use renderer::{Canvas, Mask};
use tracing::debug;
use vector_field::Field;

use crate::config::overlay_enabled;

const GRID_POINT_COLOR: Rgba = Rgba::new(255, 255, 255, 255);

/// Clear `surface` and, unless the overlay is off, copy the field's colored mask onto it.
///
/// With any overlay type set, including `"off"`, the lattice points of `grid_points`
/// are then plotted through the globe's projection.
pub fn draw_overlay(
    field: Option<&Field>,
    overlay_type: Option<&str>,
    grid_points: Option<(&dyn Grid, &dyn Globe)>,
    surface: &mut Canvas,
) -> FlowResult<()> {
    let Some(field) = field else {
        return Ok(());
    };

    surface.clear();
    if overlay_enabled(overlay_type) {
        surface.put_mask(field.overlay())?;
        debug!(overlay = overlay_type, "Overlay drawn");
    }
    if let (Some(_), Some((grid, globe))) = (overlay_type, grid_points) {
        draw_grid_points(grid, globe, surface);
    }
    Ok(())
}

/// Plot each lattice point of `grid` that holds data and is visible on the globe.
pub fn draw_grid_points(grid: &dyn Grid, globe: &dyn Globe, surface: &mut Canvas) {
    let projection = globe.projection();
    let points: Vec<(f64, f64)> = grid
        .lattice_points()
        .into_iter()
        .filter_map(|(lon, lat)| projection.project(lon, lat))
        .collect();
    surface.plot_points(GRID_POINT_COLOR, &points);
    debug!(grid = grid.name(), points = points.len(), "Grid points drawn");
}

/// Render `scale` as a horizontal color bar from its low to its high bound.
pub fn color_bar(scale: &dyn ColorScale, width: usize, height: usize) -> FlowResult<Canvas> {
    let view = View::new(width, height);
    let mut bar = Mask::opaque(view);
    for (x, color) in sample_scale(scale, width, 255).into_iter().enumerate() {
        for y in 0..height {
            bar.set(x, y, color);
        }
    }

    let mut canvas = Canvas::new(view)?;
    canvas.put_mask(&bar)?;
    Ok(canvas)
}

/// What lies under a screen point.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    /// Geographic coordinate `(lon, lat)`, when the point inverts to a finite one.
    pub coord: Option<(f64, f64)>,
    /// Primary grid value at the coordinate.
    pub primary: Option<GridValue>,
    /// Value of a distinct overlay grid at the coordinate.
    pub overlay: Option<GridValue>,
}

/// Describe the point `(x, y)`. `None` when it lies outside the field's boundary.
///
/// Grid values are only looked up where the field is defined.
pub fn probe(
    point: (f64, f64),
    field: Option<&Field>,
    globe: Option<&Arc<dyn Globe>>,
    grids: Option<&GridPair>,
) -> Option<Probe> {
    let field = field?;
    let (x, y) = point;
    if !field.is_inside_boundary(x, y) {
        return None;
    }

    let coord = globe
        .and_then(|globe| globe.projection().invert(x, y))
        .filter(|(lon, lat)| lon.is_finite() && lat.is_finite());

    let mut probe = Probe {
        coord,
        primary: None,
        overlay: None,
    };

    if let (Some((lon, lat)), Some(grids)) = (coord, grids) {
        if field.is_defined(x, y) {
            probe.primary = grids.primary.interpolate(lon, lat);
            if grids.has_distinct_overlay() {
                probe.overlay = grids.overlay_grid().interpolate(lon, lat);
            }
        }
    }

    Some(probe)
}
