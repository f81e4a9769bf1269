//! Field builder tests against hand-checkable fixtures.

use std::sync::{Arc, Mutex};

use agent::CancelCheck;
use flow_common::{FlowError, Grid, GridPair, GridSpec, Rgba, View, Wind};
use projection::{distort, distortion, Globe};
use renderer::Mask;
use test_utils::{
    assert_approx_eq, temperature_grid, views, zonal_wind_grid, ConstantGrid, DiscGlobe,
    FullViewGlobe, IdentityProjection, ScalarGrid,
};
use tokio_util::sync::CancellationToken;
use vector_field::{build_field, BuilderConfig, Field, FieldSample, NoProgress};

// ============================================================================
// Helpers
// ============================================================================

fn wind_pair() -> GridPair {
    GridPair::new(Arc::new(ConstantGrid::new(1.0, 0.0, 5.0)))
}

async fn build(globe: Arc<dyn Globe>, grids: GridPair, view: View) -> Field {
    build_field(
        Some(globe),
        Some(grids),
        view,
        &BuilderConfig::default(),
        &CancelCheck::never(),
        &NoProgress,
    )
    .await
    .expect("build succeeds")
    .expect("inputs present")
}

/// Config that yields after every column without sleeping.
fn sliced_config() -> BuilderConfig {
    BuilderConfig {
        max_task_time_ms: 0,
        min_sleep_time_ms: 0,
        ..BuilderConfig::default()
    }
}

// ============================================================================
// Boundary and holes
// ============================================================================

#[tokio::test]
async fn test_small_disc_boundary() {
    let globe = Arc::new(DiscGlobe::new(2.0, 2.0, 2.0));
    let field = build(globe, wind_pair(), views::TINY).await;

    assert!(!field.is_inside_boundary(0.0, 0.0));
    assert!(!field.is_inside_boundary(3.0, 3.0));

    match field.sample(2.0, 2.0) {
        FieldSample::Vector(wind) => assert_eq!(wind.magnitude, 5.0),
        other => panic!("expected vector at (2, 2), got {:?}", other),
    }
}

#[tokio::test]
async fn test_pixels_outside_mask_are_missing() {
    let view = View::new(32, 32);
    let globe = Arc::new(DiscGlobe::centered(view));
    let mask = Mask::rasterize(&globe.mask_outline(view), view).unwrap();
    let field = build(globe, wind_pair(), view).await;

    for x in 0..32 {
        for y in 0..32 {
            if !mask.is_visible(x, y) {
                assert!(
                    !field.is_inside_boundary(x as f64, y as f64),
                    "masked pixel ({}, {}) inside boundary",
                    x,
                    y
                );
            }
        }
    }
    assert!(field.is_defined(16.0, 16.0));
}

#[tokio::test]
async fn test_missing_grid_data_is_a_hole() {
    let view = View::new(8, 8);
    let grid = ConstantGrid::new(1.0, 0.0, 5.0).with_gap(0.0, 3.0);
    let field = build(Arc::new(FullViewGlobe::new()), GridPair::new(Arc::new(grid)), view).await;

    assert_eq!(field.sample(2.0, 4.0), FieldSample::Hole);
    assert!(field.is_inside_boundary(2.0, 4.0));
    assert!(!field.is_defined(2.0, 4.0));
    assert!(field.is_defined(4.0, 4.0));
}

#[tokio::test]
async fn test_last_row_and_column_are_missing() {
    // Rows and columns stop before the inclusive maximum
    let view = View::new(7, 7);
    let field = build(Arc::new(FullViewGlobe::new()), wind_pair(), view).await;

    assert!(field.is_defined(5.0, 5.0));
    assert!(!field.is_inside_boundary(6.0, 3.0));
    assert!(!field.is_inside_boundary(3.0, 6.0));
}

// ============================================================================
// Distortion
// ============================================================================

#[test]
fn test_identity_projection_distortion_at_equator() {
    let d = distortion(&IdentityProjection, 0.0, 0.0, 0.0, 0.0).unwrap();
    assert_approx_eq!(d[(0, 0)], 1.0, 1e-6);
    assert_approx_eq!(d[(0, 1)], 0.0, 1e-6);
    assert_approx_eq!(d[(1, 0)], 0.0, 1e-6);
    assert_approx_eq!(d[(1, 1)], 1.0, 1e-6);
}

#[test]
fn test_identity_projection_leaves_wind_unchanged() {
    let wind = distort(&IdentityProjection, 10.0, 0.0, 10.0, 0.0, 1.0, Wind::new(3.0, -2.0))
        .unwrap();
    assert_approx_eq!(wind.u, 3.0, 1e-6);
    assert_approx_eq!(wind.v, -2.0, 1e-6);
    assert_approx_eq!(wind.magnitude, 13.0_f64.sqrt(), 1e-9);
}

#[tokio::test]
async fn test_vectors_scaled_by_bounds_height() {
    let view = View::new(8, 8);
    let field = build(Arc::new(FullViewGlobe::new()), wind_pair(), view).await;

    // Latitude 0: undistorted, scaled by height 8 and velocity scale 1
    let wind = field.sample(2.0, 0.0).wind().unwrap();
    assert_approx_eq!(wind.u, 8.0, 1e-6);
    assert_approx_eq!(wind.v, 0.0, 1e-6);
    assert_eq!(wind.magnitude, 5.0);
}

#[tokio::test]
async fn test_lattice_wind_follows_grid() {
    let view = View::new(8, 8);
    let wind = zonal_wind_grid(GridSpec::global_one_degree());
    let tuning = wind.particles().unwrap();
    let field = build(
        Arc::new(FullViewGlobe::new()),
        GridPair::new(Arc::new(wind)),
        view,
    )
    .await;

    // Easterly of 10 m/s on the equator, with a small meridional part at 2°E
    let sample = field.sample(2.0, 0.0).wind().unwrap();
    assert_approx_eq!(sample.u, -10.0 * 8.0 * tuning.velocity_scale, 1e-9);
    let v = 3.0 * 2.0_f64.to_radians().sin();
    assert_approx_eq!(sample.magnitude, (100.0 + v * v).sqrt(), 1e-4);
}

// ============================================================================
// Overlay colors
// ============================================================================

#[tokio::test]
async fn test_overlay_colored_by_wind_magnitude() {
    let view = View::new(8, 8);
    let field = build(Arc::new(FullViewGlobe::new()), wind_pair(), view).await;
    assert_eq!(field.overlay().get(2, 2), Some(Rgba::new(5, 5, 5, 102)));
}

#[tokio::test]
async fn test_distinct_overlay_wins() {
    let view = View::new(8, 8);
    let wind: Arc<dyn Grid> = Arc::new(ConstantGrid::new(1.0, 0.0, 5.0));
    let temp: Arc<dyn Grid> = Arc::new(ScalarGrid::new(200.0).named("temp"));
    let field = build(
        Arc::new(FullViewGlobe::new()),
        GridPair::with_overlay(wind, temp),
        view,
    )
    .await;

    assert_eq!(field.overlay().get(2, 2), Some(Rgba::new(200, 200, 200, 102)));
    // The vectors still come from the primary grid
    assert_eq!(field.sample(2.0, 2.0).wind().unwrap().magnitude, 5.0);
}

#[tokio::test]
async fn test_lattice_temperature_colors_overlay() {
    let view = View::new(8, 8);
    let wind: Arc<dyn Grid> = Arc::new(zonal_wind_grid(GridSpec::global_one_degree()));
    let temp: Arc<dyn Grid> = Arc::new(temperature_grid(GridSpec::global_one_degree()));
    let field = build(
        Arc::new(FullViewGlobe::new()),
        GridPair::with_overlay(wind, temp),
        view,
    )
    .await;

    // Near 300 K in the tropics, past the top of the gray ramp
    assert_eq!(field.overlay().get(2, 2), Some(Rgba::new(255, 255, 255, 102)));
    assert!(field.is_defined(2.0, 2.0));
}

#[tokio::test]
async fn test_overlay_alpha_is_configurable() {
    let view = View::new(4, 4);
    let config = BuilderConfig {
        overlay_alpha: 255,
        ..BuilderConfig::default()
    };
    let field = build_field(
        Some(Arc::new(FullViewGlobe::new())),
        Some(wind_pair()),
        view,
        &config,
        &CancelCheck::never(),
        &NoProgress,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(field.overlay().get(0, 0).unwrap().a, 255);
}

// ============================================================================
// Inputs and errors
// ============================================================================

#[tokio::test]
async fn test_absent_inputs_build_nothing() {
    let config = BuilderConfig::default();
    let cancel = CancelCheck::never();

    let none = build_field(None, Some(wind_pair()), views::TINY, &config, &cancel, &NoProgress)
        .await
        .unwrap();
    assert!(none.is_none());

    let globe: Arc<dyn Globe> = Arc::new(FullViewGlobe::new());
    let none = build_field(Some(globe), None, views::TINY, &config, &cancel, &NoProgress)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_empty_view_is_rejected() {
    let result = build_field(
        Some(Arc::new(FullViewGlobe::new())),
        Some(wind_pair()),
        View::new(0, 0),
        &BuilderConfig::default(),
        &CancelCheck::never(),
        &NoProgress,
    )
    .await;
    assert!(matches!(result, Err(FlowError::InvalidBounds(_))));
}

// ============================================================================
// Time slicing and cancellation
// ============================================================================

#[tokio::test]
async fn test_progress_reported_between_batches() {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let reports = reports.clone();
        move |amount: f64| reports.lock().unwrap().push(amount)
    };

    let view = View::new(16, 16);
    build_field(
        Some(Arc::new(FullViewGlobe::new())),
        Some(wind_pair()),
        view,
        &sliced_config(),
        &CancelCheck::never(),
        &sink,
    )
    .await
    .unwrap()
    .unwrap();

    let reports = reports.lock().unwrap();
    assert!(reports.len() > 2);
    assert_eq!(reports.last(), Some(&1.0));
    let partial = &reports[..reports.len() - 1];
    assert!(partial.iter().all(|&p| p > 0.0 && p < 1.0));
    assert!(partial.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let result = build_field(
        Some(Arc::new(FullViewGlobe::new())),
        Some(wind_pair()),
        View::new(16, 16),
        &BuilderConfig::default(),
        &CancelCheck::from(token),
        &NoProgress,
    )
    .await;
    assert!(matches!(result, Err(FlowError::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_between_batches() {
    let token = CancellationToken::new();
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let token = token.clone();
        let reports = reports.clone();
        move |amount: f64| {
            reports.lock().unwrap().push(amount);
            token.cancel();
        }
    };

    let result = build_field(
        Some(Arc::new(FullViewGlobe::new())),
        Some(wind_pair()),
        View::new(16, 16),
        &sliced_config(),
        &CancelCheck::from(token),
        &sink,
    )
    .await;

    assert!(matches!(result, Err(FlowError::Cancelled)));
    // Cancelled after the first batch, never reaching completion
    assert_eq!(reports.lock().unwrap().len(), 1);
}
