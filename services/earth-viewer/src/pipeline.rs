//! Wiring of the grid, globe, field, animator and overlay agents.
//!
//! ```text
//! set_grids ─► grid ──update──┐                 ┌──update──► animator ─► frames
//!                             ├─► field (build) ┤
//! set_globe ─► globe ─► renderer{Start,Render}  └──update──► overlay ─► overlay canvas
//! ```
//!
//! Every upstream change cancels the downstream work it invalidates. Failures of any
//! agent go to the [`Reporter`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use agent::{Agent, AgentError, AgentEvent, EventBus, TaskInput};
use animator::{animate, AnimatorConfig, FrameSink};
use flow_common::{FlowResult, Grid, GridPair, View};
use projection::Globe;
use renderer::Canvas;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use vector_field::{build_field, BuilderConfig, Field};

use crate::config::ViewerConfig;
use crate::overlay::{self, Probe};
use crate::report::Reporter;

/// Height of the rendered color bar.
const COLOR_BAR_HEIGHT: usize = 12;

/// Signals published by the renderer when the globe is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSignal {
    /// A new globe is about to be drawn.
    Start,
    /// The globe is being moved.
    Redraw,
    /// The globe has been drawn and is ready for a field.
    Render,
}

/// View and stage settings for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub view: View,
    pub builder: BuilderConfig,
    pub animator: AnimatorConfig,
    pub overlay_type: Option<String>,
    pub show_grid_points: bool,
}

impl From<&ViewerConfig> for PipelineSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            view: config.view,
            builder: config.builder.clone(),
            animator: AnimatorConfig {
                max_frames: Some(config.frames),
                ..config.animator.clone()
            },
            overlay_type: config.overlay_type.clone(),
            show_grid_points: config.show_grid_points,
        }
    }
}

/// The drawing surfaces shared between the pipeline and its output.
#[derive(Debug, Clone)]
pub struct Surfaces {
    pub animation: Arc<Mutex<Canvas>>,
    pub overlay: Arc<Mutex<Canvas>>,
}

impl Surfaces {
    pub fn new(view: View) -> FlowResult<Self> {
        Ok(Self {
            animation: Arc::new(Mutex::new(Canvas::new(view)?)),
            overlay: Arc::new(Mutex::new(Canvas::new(view)?)),
        })
    }
}

struct Inner {
    view: View,
    builder: BuilderConfig,
    animator_config: AnimatorConfig,

    grid: Agent<Option<GridPair>>,
    globe: Agent<Option<Arc<dyn Globe>>>,
    field: Agent<Option<Arc<Field>>>,
    animator: Agent<()>,
    overlay: Agent<()>,
    renderer: EventBus<RenderSignal>,

    surfaces: Surfaces,
    color_bar: Arc<Mutex<Option<Canvas>>>,
    overlay_type: Mutex<Option<String>>,
    show_grid_points: Mutex<bool>,
    reporter: Reporter,
    frames: Arc<dyn FrameSink>,
}

/// The running visualization. Cloning yields another handle to the same pipeline.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

impl Pipeline {
    /// Create the agents and wire their events together.
    pub fn new(
        settings: PipelineSettings,
        surfaces: Surfaces,
        reporter: Reporter,
        frames: Arc<dyn FrameSink>,
    ) -> Self {
        let inner = Arc::new(Inner {
            view: settings.view,
            builder: settings.builder,
            animator_config: settings.animator,
            grid: Agent::new(None).with_name("grid"),
            globe: Agent::new(None).with_name("globe"),
            field: Agent::new(None).with_name("field"),
            animator: Agent::new(()).with_name("animator"),
            overlay: Agent::new(()).with_name("overlay"),
            renderer: EventBus::new(),
            surfaces,
            color_bar: Arc::new(Mutex::new(None)),
            overlay_type: Mutex::new(settings.overlay_type),
            show_grid_points: Mutex::new(settings.show_grid_points),
            reporter,
            frames,
        });
        wire(&inner);
        Self { inner }
    }

    /// Replace the globe. Once accepted the renderer signals `Start` then `Render`.
    #[instrument(skip_all)]
    pub fn set_globe(&self, globe: Arc<dyn Globe>) -> JoinHandle<()> {
        self.inner.reporter.status("Rendering map...");
        self.inner
            .globe
            .submit(move |_cancel| async move { Ok(Some(globe)) })
    }

    /// Replace the grids with `input` once it resolves.
    #[instrument(skip_all)]
    pub fn set_grids(&self, input: TaskInput<GridPair>) -> JoinHandle<()> {
        self.inner.reporter.status("Downloading...");
        self.inner
            .grid
            .submit_with(input, |grids, _cancel| async move { Ok(Some(grids)) })
    }

    /// Show a different overlay, or hide it with `None` or `"off"`.
    #[instrument(skip(self))]
    pub fn set_overlay_type(&self, overlay_type: Option<String>) -> JoinHandle<()> {
        *lock(&self.inner.overlay_type) = overlay_type.clone();
        self.inner.draw_overlay(self.inner.field.value(), overlay_type)
    }

    /// Show or hide the overlay grid's lattice points.
    #[instrument(skip(self))]
    pub fn set_show_grid_points(&self, show: bool) -> JoinHandle<()> {
        *lock(&self.inner.show_grid_points) = show;
        let overlay_type = lock(&self.inner.overlay_type).clone();
        self.inner.draw_overlay(self.inner.field.value(), overlay_type)
    }

    /// Publish a renderer signal.
    pub fn signal(&self, signal: RenderSignal) {
        self.inner.signal(signal);
    }

    /// Details of the screen point `(x, y)`.
    pub fn probe(&self, point: (f64, f64)) -> Option<Probe> {
        let field = self.inner.field.value();
        let globe = self.inner.globe.value();
        let grids = self.inner.grid.value();
        overlay::probe(point, field.as_deref(), globe.as_ref(), grids.as_ref())
    }

    /// The overlay drawn over the animation.
    pub fn composite(&self) -> Canvas {
        // Animation before overlay, the same order as frame output
        let animation = lock(&self.inner.surfaces.animation);
        let overlay = lock(&self.inner.surfaces.overlay);
        crate::output::composite(&animation, &overlay)
    }

    /// The color bar of the current overlay grid, once drawn.
    pub fn color_bar(&self) -> Option<Canvas> {
        lock(&self.inner.color_bar).clone()
    }

    /// Cancel every stage.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        inner.grid.cancel();
        inner.globe.cancel();
        inner.field.cancel();
        inner.animator.cancel();
        inner.overlay.cancel();
        info!("Pipeline stopped");
    }

    pub fn grid(&self) -> &Agent<Option<GridPair>> {
        &self.inner.grid
    }

    pub fn globe(&self) -> &Agent<Option<Arc<dyn Globe>>> {
        &self.inner.globe
    }

    pub fn field(&self) -> &Agent<Option<Arc<Field>>> {
        &self.inner.field
    }

    pub fn animator(&self) -> &Agent<()> {
        &self.inner.animator
    }

    pub fn overlay(&self) -> &Agent<()> {
        &self.inner.overlay
    }

    pub fn renderer(&self) -> &EventBus<RenderSignal> {
        &self.inner.renderer
    }

    pub fn reporter(&self) -> &Reporter {
        &self.inner.reporter
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.inner.surfaces
    }
}

/// Subscribe `handler` to `bus` without keeping the pipeline alive.
fn observe<E, F>(bus: &EventBus<E>, inner: &Arc<Inner>, handler: F)
where
    E: 'static,
    F: Fn(&Inner, &E) + Send + Sync + 'static,
{
    let weak = Arc::downgrade(inner);
    bus.subscribe(move |event| {
        if let Some(inner) = weak.upgrade() {
            handler(&inner, event);
        }
        Ok(())
    });
}

fn report_failures<T>(bus: &EventBus<AgentEvent<T>>, inner: &Arc<Inner>)
where
    T: 'static,
{
    observe(bus, inner, |inner, event| match event {
        AgentEvent::Reject(err) | AgentEvent::Fail(err) => inner.reporter.error(err),
        _ => {}
    });
}

fn wire(inner: &Arc<Inner>) {
    observe(inner.grid.bus(), inner, |inner, event| match event {
        AgentEvent::Submit => inner.stop_animation(false),
        AgentEvent::Update(grids) => {
            if let Some(grids) = grids {
                info!(
                    grid = grids.primary.name(),
                    date = %grids.primary.date().format("%Y-%m-%d %H:%M UTC"),
                    "Grids valid"
                );
            }
            inner.start_interpolation();
        }
        _ => {}
    });

    observe(inner.globe.bus(), inner, |inner, event| {
        if let AgentEvent::Update(_) = event {
            inner.signal(RenderSignal::Start);
            inner.signal(RenderSignal::Render);
        }
    });

    observe(&inner.renderer, inner, |inner, signal| match signal {
        RenderSignal::Start => {
            inner.field.cancel();
            inner.stop_animation(true);
            inner.draw_overlay(inner.field.value(), None);
        }
        RenderSignal::Redraw => inner.field.cancel(),
        RenderSignal::Render => {
            inner.start_interpolation();
        }
    });

    observe(inner.field.bus(), inner, |inner, event| match event {
        AgentEvent::Submit => inner.stop_animation(false),
        AgentEvent::Update(field) => {
            inner.start_animation(field.clone());
            let overlay_type = lock(&inner.overlay_type).clone();
            inner.draw_overlay(field.clone(), overlay_type);
        }
        _ => {}
    });

    report_failures(inner.grid.bus(), inner);
    report_failures(inner.globe.bus(), inner);
    report_failures(inner.field.bus(), inner);
    report_failures(inner.animator.bus(), inner);
    report_failures(inner.overlay.bus(), inner);
}

impl Inner {
    fn signal(&self, signal: RenderSignal) {
        debug!(?signal, "Renderer signal");
        for failure in self.renderer.publish(&signal) {
            warn!(?signal, error = %failure.error, "Renderer observer failed");
        }
    }

    fn start_interpolation(&self) -> JoinHandle<()> {
        let globe = self.globe.value();
        let grids = self.grid.value();
        let view = self.view;
        let config = self.builder.clone();
        let reporter = self.reporter.clone();

        self.field.submit(move |cancel| async move {
            let progress = |amount: f64| reporter.progress(amount);
            let field = build_field(globe, grids, view, &config, &cancel, &progress).await?;
            if field.is_some() {
                reporter.status("");
            }
            Ok::<_, AgentError>(field.map(Arc::new))
        })
    }

    fn start_animation(&self, field: Option<Arc<Field>>) -> JoinHandle<()> {
        let globe = self.globe.value();
        let grids = self.grid.value();
        let view = self.view;
        let canvas = self.surfaces.animation.clone();
        let config = self.animator_config.clone();
        let frames = self.frames.clone();

        self.animator.submit(move |cancel| async move {
            animate(
                globe,
                field,
                grids,
                view,
                canvas,
                &config,
                &cancel,
                frames.as_ref(),
            )
            .await
            .map_err(AgentError::from)
        })
    }

    /// Cancel the animation, optionally wiping its trails.
    fn stop_animation(&self, clear: bool) {
        self.animator.cancel();
        if clear {
            lock(&self.surfaces.animation).clear();
        }
    }

    fn draw_overlay(
        &self,
        field: Option<Arc<Field>>,
        overlay_type: Option<String>,
    ) -> JoinHandle<()> {
        let surface = self.surfaces.overlay.clone();
        let color_bar = self.color_bar.clone();
        let grids = self.grid.value();
        let globe = self.globe.value();
        let show_grid_points = *lock(&self.show_grid_points);
        let width = self.view.width;

        self.overlay.submit(move |_cancel| async move {
            let grid_points = match (&grids, &globe) {
                (Some(grids), Some(globe)) if show_grid_points => {
                    Some((grids.overlay_grid().as_ref(), globe.as_ref()))
                }
                _ => None,
            };
            overlay::draw_overlay(
                field.as_deref(),
                overlay_type.as_deref(),
                grid_points,
                &mut lock(&surface),
            )?;
            if let (Some(_), Some(grids)) = (&field, &grids) {
                let scale = grids.overlay_grid().scale();
                let bar = overlay::color_bar(scale, width, COLOR_BAR_HEIGHT)?;
                *lock(&color_bar) = Some(bar);
            }
            Ok::<_, AgentError>(())
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
