//! The animation frame loop.

use std::sync::{Arc, Mutex, PoisonError};

use agent::CancelCheck;
use flow_common::{FlowResult, GridPair, View};
use metrics::{counter, gauge};
use projection::Globe;
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::{Canvas, WindIntensityScale};
use tracing::{debug, info, instrument};
use vector_field::Field;

use crate::{AnimatorConfig, ParticleSystem};

/// Receives the animation canvas after every drawn frame.
pub trait FrameSink: Send + Sync {
    fn frame(&self, index: u64, canvas: &Canvas) -> FlowResult<()>;
}

impl<F> FrameSink for F
where
    F: Fn(u64, &Canvas) -> FlowResult<()> + Send + Sync,
{
    fn frame(&self, index: u64, canvas: &Canvas) -> FlowResult<()> {
        self(index, canvas)
    }
}

/// Ignores frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFrames;

impl FrameSink for NoFrames {
    fn frame(&self, _index: u64, _canvas: &Canvas) -> FlowResult<()> {
        Ok(())
    }
}

/// Animate particles over `field` on `canvas` until cancelled.
///
/// Does nothing when any input is absent. Cancellation is checked before each frame;
/// once observed the field is released and the loop returns `Ok(())`. An error from
/// `frames` ends the run.
#[instrument(skip_all, fields(width = view.width, height = view.height))]
#[allow(clippy::too_many_arguments)]
pub async fn animate(
    globe: Option<Arc<dyn Globe>>,
    field: Option<Arc<Field>>,
    grids: Option<GridPair>,
    view: View,
    canvas: Arc<Mutex<Canvas>>,
    config: &AnimatorConfig,
    cancel: &CancelCheck,
    frames: &dyn FrameSink,
) -> FlowResult<()> {
    let (Some(globe), Some(field), Some(grids)) = (globe, field, grids) else {
        debug!("Globe, field or grids missing, nothing to animate");
        return Ok(());
    };

    let bounds = globe.bounds(view);
    let tuning = grids.particles()?;
    let styles = WindIntensityScale::new(config.intensity_scale_step, tuning.max_intensity);
    let count = config.particle_count(bounds.width);
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut system = ParticleSystem::new(&field, bounds, styles, count, config, &mut rng);

    counter!("animation_runs_total").increment(1);
    gauge!("animation_particles").set(count as f64);
    info!(
        particles = count,
        mobile = config.mobile,
        grid = grids.primary.name(),
        "Animation started"
    );

    let mut index = 0u64;
    loop {
        if cancel.is_cancelled() {
            field.release();
            debug!(frames = index, "Animation cancelled, field released");
            return Ok(());
        }
        if config.max_frames.is_some_and(|max| index >= max) {
            info!(frames = index, "Animation finished");
            return Ok(());
        }

        system.evolve(&field, &mut rng);
        {
            let mut canvas = canvas.lock().unwrap_or_else(PoisonError::into_inner);
            system.draw(&mut canvas);
            frames.frame(index, &canvas)?;
        }
        counter!("animation_frames_total").increment(1);
        index += 1;

        tokio::time::sleep(config.frame_interval()).await;
    }
}
