//! Field construction.

use std::sync::Arc;
use std::time::Instant;

use agent::CancelCheck;
use flow_common::{
    Bounds, FlowError, FlowResult, GridPair, GridValue, ParticleTuning, Rgba, View,
};
use metrics::{counter, histogram};
use projection::{distort, Globe};
use renderer::Mask;
use tracing::{debug, info, instrument};

use crate::{BuilderConfig, Field, FieldSample, ProgressSink};

/// Overlay alpha, `floor(0.4 * 255)`.
pub const OVERLAY_ALPHA: u8 = 102;

/// Build the field for `globe` and `grids` in `view`.
///
/// Returns `Ok(None)` when either input is absent. Columns are processed in batches of
/// at most `config.max_task_time`; between batches the builder reports progress,
/// sleeps `config.min_sleep_time` and checks `cancel`. A cancelled build returns
/// [`FlowError::Cancelled`] and discards the partial field.
#[instrument(skip_all, fields(width = view.width, height = view.height))]
pub async fn build_field(
    globe: Option<Arc<dyn Globe>>,
    grids: Option<GridPair>,
    view: View,
    config: &BuilderConfig,
    cancel: &CancelCheck,
    progress: &dyn ProgressSink,
) -> FlowResult<Option<Field>> {
    let (Some(globe), Some(grids)) = (globe, grids) else {
        debug!("Globe or grids missing, nothing to build");
        return Ok(None);
    };

    let started = Instant::now();
    let bounds = globe.bounds(view);
    bounds.validate(view)?;
    let mask = Mask::rasterize(&globe.mask_outline(view), view)?;

    let tuning = grids.primary.particles().unwrap_or_else(ParticleTuning::default);
    let mut sampler = Sampler {
        globe: globe.as_ref(),
        grids: &grids,
        bounds,
        velocity_scale: bounds.height as f64 * tuning.velocity_scale,
        alpha: config.overlay_alpha,
        columns: vec![vec![FieldSample::Missing; bounds.height]; bounds.width],
        mask,
    };

    debug!(
        primary = grids.primary.name(),
        overlay = grids.overlay_grid().name(),
        x = bounds.x,
        y = bounds.y,
        x_max = bounds.x_max,
        y_max = bounds.y_max,
        "Interpolating field"
    );

    let span = (bounds.x_max - bounds.x) as f64;
    let mut x = bounds.x;
    while x < bounds.x_max {
        if cancel.is_cancelled() {
            counter!("field_build_cancelled_total").increment(1);
            debug!(column = x, "Field build cancelled");
            return Err(FlowError::Cancelled);
        }

        let batch = Instant::now();
        while x < bounds.x_max {
            sampler.interpolate_column(x);
            x += 2;
            if x < bounds.x_max && batch.elapsed() >= config.max_task_time() {
                progress.progress((x - bounds.x) as f64 / span);
                tokio::time::sleep(config.min_sleep_time()).await;
                break;
            }
        }
    }

    let field = Field::new(bounds, sampler.columns, sampler.mask);
    progress.progress(1.0);

    let elapsed = started.elapsed();
    counter!("field_builds_total").increment(1);
    histogram!("field_build_duration_seconds").record(elapsed.as_secs_f64());
    info!(
        defined = field.defined_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Field built"
    );
    Ok(Some(field))
}

/// State for one build.
struct Sampler<'a> {
    globe: &'a dyn Globe,
    grids: &'a GridPair,
    bounds: Bounds,
    velocity_scale: f64,
    alpha: u8,
    columns: Vec<Vec<FieldSample>>,
    mask: Mask,
}

impl Sampler<'_> {
    /// Sample every other row of column `x`, filling 2x2 blocks.
    fn interpolate_column(&mut self, x: usize) {
        for y in (self.bounds.y..self.bounds.y_max).step_by(2) {
            if !self.mask.is_visible(x, y) {
                continue;
            }
            let (sample, scalar) = self.sample_point(x, y);
            let color = match scalar {
                Some(value) => self.grids.overlay_grid().scale().gradient(value, self.alpha),
                None => Rgba::TRANSPARENT,
            };
            self.fill_block(x, y, sample, color);
        }
    }

    /// The field sample at `(x, y)` and the scalar used to color it.
    fn sample_point(&self, x: usize, y: usize) -> (FieldSample, Option<f64>) {
        let projection = self.globe.projection();
        let Some((lon, lat)) = projection
            .invert(x as f64, y as f64)
            .filter(|(lon, _)| lon.is_finite())
        else {
            return (FieldSample::Hole, None);
        };

        let (sample, mut scalar) = match self.grids.primary.interpolate(lon, lat) {
            Some(GridValue::Vector(wind)) => {
                let sample = distort(
                    projection,
                    lon,
                    lat,
                    x as f64,
                    y as f64,
                    self.velocity_scale,
                    wind,
                )
                .map_or(FieldSample::Hole, FieldSample::Vector);
                (sample, Some(wind.magnitude))
            }
            Some(GridValue::Scalar(value)) => (FieldSample::Hole, Some(value)),
            None => (FieldSample::Hole, None),
        };

        if let Some(overlay) = &self.grids.overlay {
            scalar = overlay.interpolate(lon, lat).map(|value| value.scalar());
        }
        (sample, scalar.filter(|value| value.is_finite()))
    }

    /// Store `sample` and `color` at the visible pixels of the block at `(x, y)`.
    fn fill_block(&mut self, x: usize, y: usize, sample: FieldSample, color: Rgba) {
        for (px, py) in [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)] {
            if !self.mask.is_visible(px, py) {
                continue;
            }
            if let Some(slot) = self
                .columns
                .get_mut(px - self.bounds.x)
                .and_then(|column| column.get_mut(py - self.bounds.y))
            {
                *slot = sample;
            }
            self.mask.set(px, py, color);
        }
    }
}
