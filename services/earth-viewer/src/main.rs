//! Earth viewer
//!
//! Renders an animated wind field on a globe and writes the frames as PNG files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use agent::{AgentError, TaskInput};
use anyhow::{bail, Context, Result};
use clap::Parser;
use projection::GlobeKind;
use renderer::StyleConfig;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use earth_viewer::grids::load_grids;
use earth_viewer::output::{write_png, FrameWriter};
use earth_viewer::{Pipeline, PipelineSettings, Reporter, Surfaces, ViewerConfig};

/// Earth viewer
#[derive(Parser, Debug)]
#[command(name = "earth-viewer")]
#[command(about = "Animate wind particles over a globe and write the frames as PNG")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "EARTH_CONFIG")]
    config: Option<PathBuf>,

    /// Number of frames to write
    #[arg(long)]
    frames: Option<u64>,

    /// Directory for frames and the color bar
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Globe projection (orthographic, equirectangular)
    #[arg(long)]
    projection: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let config = load_config(&args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run(config))
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if args.pretty {
        builder.init();
    } else {
        builder.json().init();
    }
}

fn load_config(args: &Args) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig::default(),
    };
    config.apply_env();

    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(name) = &args.projection {
        config.globe.projection = match GlobeKind::parse(name) {
            Some(kind) => kind,
            None => bail!("unknown projection '{}'", name),
        };
    }

    config.validate()?;
    Ok(config)
}

async fn run(config: ViewerConfig) -> Result<()> {
    if let Some(listen) = &config.metrics_listen {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid metrics_listen address '{}'", listen))?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus metrics exporter listening");
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create {}", config.output_dir.display())
    })?;

    let styles = match &config.styles_path {
        Some(path) => StyleConfig::from_file(&path.to_string_lossy())?,
        None => StyleConfig::builtin()?,
    };

    info!(
        width = config.view.width,
        height = config.view.height,
        projection = ?config.globe.projection,
        frames = config.frames,
        output_dir = %config.output_dir.display(),
        "Starting earth viewer"
    );

    let surfaces = Surfaces::new(config.view)?;
    let reporter = Reporter::new();
    let writer = Arc::new(FrameWriter::new(
        &config.output_dir,
        surfaces.overlay.clone(),
        config.frames,
    ));
    let pipeline = Pipeline::new(
        PipelineSettings::from(&config),
        surfaces,
        reporter.clone(),
        writer.clone(),
    );

    pipeline.set_globe(
        config
            .globe
            .projection
            .build(config.view, config.globe.center()),
    );

    let grid_config = config.grid.clone();
    pipeline.set_grids(TaskInput::pending(async move {
        tokio::task::spawn_blocking(move || load_grids(&grid_config, &styles))
            .await
            .map_err(|e| AgentError::Input(e.to_string()))?
            .map_err(|e| AgentError::Input(e.to_string()))
    }));

    let mut report = reporter.subscribe();
    tokio::select! {
        _ = writer.finished() => {}
        state = report.wait_for(|s| s.error.is_some()) => {
            let msg = state
                .ok()
                .and_then(|s| s.error.clone())
                .unwrap_or_else(|| "reporter closed".to_string());
            pipeline.shutdown();
            error!(error = %msg, "Viewer failed");
            bail!(msg);
        }
    }

    pipeline.shutdown();

    if let Some(bar) = pipeline.color_bar() {
        write_png(&config.output_dir.join("scale.png"), &bar)?;
    }

    info!(
        frames = writer.written(),
        output_dir = %config.output_dir.display(),
        "Frames written"
    );
    Ok(())
}
