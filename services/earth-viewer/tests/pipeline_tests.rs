//! Pipeline wiring tests: globe and grid changes flowing through field, animation
//! and overlay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agent::{AgentError, TaskInput};
use animator::{AnimatorConfig, FrameSink};
use earth_viewer::{Pipeline, PipelineSettings, RenderSignal, Reporter, Surfaces};
use flow_common::{FlowResult, GridPair, GridSpec, GridValue, ParticleTuning, View};
use renderer::Canvas;
use test_utils::{views, wait_until, zonal_wind_grid, ConstantGrid, DiscGlobe};
use vector_field::BuilderConfig;

const TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    pipeline: Pipeline,
    frames: Arc<AtomicU64>,
    view: View,
}

fn harness(max_frames: Option<u64>) -> Harness {
    let view = views::SMALL;
    let frames = Arc::new(AtomicU64::new(0));
    let sink: Arc<dyn FrameSink> = {
        let frames = frames.clone();
        Arc::new(move |_: u64, _: &Canvas| -> FlowResult<()> {
            frames.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };
    let settings = PipelineSettings {
        view,
        builder: BuilderConfig::default(),
        animator: AnimatorConfig {
            frame_interval_ms: 1,
            max_frames,
            seed: Some(7),
            ..AnimatorConfig::default()
        },
        overlay_type: Some("default".to_string()),
        show_grid_points: false,
    };
    let pipeline = Pipeline::new(
        settings,
        Surfaces::new(view).unwrap(),
        Reporter::new(),
        sink,
    );
    Harness {
        pipeline,
        frames,
        view,
    }
}

fn wind(u: f64) -> GridPair {
    let grid = ConstantGrid::new(u, 0.5, 4.0).with_particles(Some(ParticleTuning {
        velocity_scale: 1.0 / 64.0,
        max_intensity: 10.0,
    }));
    GridPair::new(Arc::new(grid))
}

fn painted(surface: &std::sync::Mutex<Canvas>) -> usize {
    surface.lock().unwrap().painted_count()
}

async fn start(h: &Harness) {
    h.pipeline.set_globe(Arc::new(DiscGlobe::centered(h.view)));
    h.pipeline.set_grids(TaskInput::Ready(wind(1.0)));
    let ready = wait_until(TIMEOUT, || h.pipeline.field().value().is_some()).await;
    assert!(ready, "field was never built");
}

// ============================================================================
// Data flow
// ============================================================================

#[tokio::test]
async fn test_inputs_flow_to_frames_and_overlay() {
    let h = harness(Some(3));
    start(&h).await;

    let animated = wait_until(TIMEOUT, || h.frames.load(Ordering::SeqCst) >= 3).await;
    assert!(animated);

    let overlaid = wait_until(TIMEOUT, || {
        painted(&h.pipeline.surfaces().overlay) > 0 && h.pipeline.color_bar().is_some()
    })
    .await;
    assert!(overlaid);

    let field = h.pipeline.field().value().unwrap();
    assert!(field.defined_count() > 0);
    assert_eq!(h.pipeline.color_bar().unwrap().width(), h.view.width);
    assert!(h.pipeline.composite().painted_count() > 0);
    h.pipeline.shutdown();
}

#[tokio::test]
async fn test_globe_without_grids_builds_no_field() {
    let h = harness(Some(3));
    h.pipeline.set_globe(Arc::new(DiscGlobe::centered(h.view)));

    // An absent field still settles the animator, which then has nothing to draw
    let settled = wait_until(TIMEOUT, || h.pipeline.animator().generation() >= 1).await;
    assert!(settled);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(h.pipeline.field().value().is_none());
    assert_eq!(h.frames.load(Ordering::SeqCst), 0);
    assert!(h.pipeline.reporter().snapshot().error.is_none());
}

#[tokio::test]
async fn test_new_grids_release_previous_field() {
    let h = harness(None);
    start(&h).await;
    let first = h.pipeline.field().value().unwrap();
    let running = wait_until(TIMEOUT, || h.frames.load(Ordering::SeqCst) > 0).await;
    assert!(running);

    h.pipeline.set_grids(TaskInput::Ready(wind(2.0)));

    let replaced = wait_until(TIMEOUT, || {
        h.pipeline
            .field()
            .value()
            .is_some_and(|field| !Arc::ptr_eq(&field, &first))
            && first.is_released()
    })
    .await;
    assert!(replaced);
    h.pipeline.shutdown();
}

// ============================================================================
// Renderer signals
// ============================================================================

#[tokio::test]
async fn test_render_start_stops_and_clears() {
    let h = harness(None);
    start(&h).await;
    let drawing = wait_until(TIMEOUT, || {
        painted(&h.pipeline.surfaces().animation) > 0 && painted(&h.pipeline.surfaces().overlay) > 0
    })
    .await;
    assert!(drawing);

    h.pipeline.signal(RenderSignal::Start);

    assert!(h.pipeline.animator().is_cancelled());
    assert!(h.pipeline.field().is_cancelled());
    assert_eq!(painted(&h.pipeline.surfaces().animation), 0);

    let cleared = wait_until(TIMEOUT, || painted(&h.pipeline.surfaces().overlay) == 0).await;
    assert!(cleared);
}

#[tokio::test]
async fn test_render_signal_rebuilds_field() {
    let h = harness(Some(1));
    start(&h).await;
    let first = h.pipeline.field().value().unwrap();

    h.pipeline.signal(RenderSignal::Redraw);
    h.pipeline.signal(RenderSignal::Render);

    let rebuilt = wait_until(TIMEOUT, || {
        h.pipeline
            .field()
            .value()
            .is_some_and(|field| !Arc::ptr_eq(&field, &first))
    })
    .await;
    assert!(rebuilt);
}

// ============================================================================
// Overlay and probing
// ============================================================================

#[tokio::test]
async fn test_overlay_type_off_hides_overlay() {
    let h = harness(Some(1));
    start(&h).await;
    let shown = wait_until(TIMEOUT, || painted(&h.pipeline.surfaces().overlay) > 0).await;
    assert!(shown);

    h.pipeline
        .set_overlay_type(Some("off".to_string()))
        .await
        .unwrap();
    assert_eq!(painted(&h.pipeline.surfaces().overlay), 0);

    h.pipeline
        .set_overlay_type(Some("default".to_string()))
        .await
        .unwrap();
    assert!(painted(&h.pipeline.surfaces().overlay) > 0);
}

#[tokio::test]
async fn test_grid_points_toggle_redraws_overlay() {
    let h = harness(Some(1));
    h.pipeline.set_globe(Arc::new(DiscGlobe::centered(h.view)));
    let grid = zonal_wind_grid(GridSpec::global_one_degree());
    h.pipeline
        .set_grids(TaskInput::Ready(GridPair::new(Arc::new(grid))));
    let ready = wait_until(TIMEOUT, || h.pipeline.field().value().is_some()).await;
    assert!(ready);

    h.pipeline
        .set_overlay_type(Some("off".to_string()))
        .await
        .unwrap();
    assert_eq!(painted(&h.pipeline.surfaces().overlay), 0);

    // Whole degrees under the identity projection cover every pixel of the view
    h.pipeline.set_show_grid_points(true).await.unwrap();
    assert_eq!(
        painted(&h.pipeline.surfaces().overlay),
        h.view.width * h.view.height
    );

    h.pipeline.set_show_grid_points(false).await.unwrap();
    assert_eq!(painted(&h.pipeline.surfaces().overlay), 0);
}

#[tokio::test]
async fn test_probe_reports_grid_values() {
    let h = harness(Some(1));
    start(&h).await;

    let center = h.pipeline.probe((32.0, 32.0)).unwrap();
    assert_eq!(center.coord, Some((32.0, 32.0)));
    assert!(matches!(center.primary, Some(GridValue::Vector(_))));
    assert!(center.overlay.is_none());

    // Outside the disc
    assert!(h.pipeline.probe((0.0, 0.0)).is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_grid_failure_is_reported() {
    let h = harness(Some(1));
    h.pipeline.set_grids(TaskInput::pending(async {
        Err(AgentError::Input("404 Not Found".to_string()))
    }));

    let reported = wait_until(TIMEOUT, || {
        h.pipeline.reporter().snapshot().error.is_some()
    })
    .await;
    assert!(reported);

    let state = h.pipeline.reporter().snapshot();
    assert!(state.error.unwrap().contains("404 Not Found"));
    assert!(h.pipeline.grid().value().is_none());
}
