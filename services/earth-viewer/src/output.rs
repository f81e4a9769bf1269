//! PNG output of composited frames and the color bar.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use animator::FrameSink;
use flow_common::{FlowError, FlowResult};
use metrics::histogram;
use renderer::png::create_png_auto;
use renderer::Canvas;
use tokio::sync::Notify;
use tracing::debug;

/// Path of frame `index` inside `dir`.
pub fn frame_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("frame-{:04}.png", index))
}

/// Encode `canvas` as PNG and write it to `path`.
pub fn write_png(path: &Path, canvas: &Canvas) -> FlowResult<()> {
    let png = create_png_auto(&canvas.to_rgba(), canvas.width(), canvas.height())?;
    std::fs::write(path, png)
        .map_err(|e| FlowError::Io(format!("failed to write {}: {}", path.display(), e)))
}

/// The animation canvas with the overlay drawn over it.
pub fn composite(animation: &Canvas, overlay: &Canvas) -> Canvas {
    let mut frame = animation.clone();
    frame.draw_canvas(overlay);
    frame
}

/// Writes every animation frame, composited with the overlay, as a numbered PNG.
///
/// A run that is cancelled early is overwritten by the next one.
/// [`FrameWriter::finished`] resolves once one run has written all `limit` frames.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    overlay: Arc<Mutex<Canvas>>,
    limit: u64,
    written: AtomicU64,
    done: Notify,
}

impl FrameWriter {
    pub fn new(dir: impl Into<PathBuf>, overlay: Arc<Mutex<Canvas>>, limit: u64) -> Self {
        Self {
            dir: dir.into(),
            overlay,
            limit,
            written: AtomicU64::new(0),
            done: Notify::new(),
        }
    }

    /// Frames written so far, across animation runs.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    pub async fn finished(&self) {
        self.done.notified().await;
    }
}

impl FrameSink for FrameWriter {
    fn frame(&self, index: u64, canvas: &Canvas) -> FlowResult<()> {
        let start = std::time::Instant::now();
        let frame = {
            let overlay = self.overlay.lock().unwrap_or_else(PoisonError::into_inner);
            composite(canvas, &overlay)
        };
        let path = frame_path(&self.dir, index);
        write_png(&path, &frame)?;
        histogram!("frame_write_duration_seconds").record(start.elapsed().as_secs_f64());
        debug!(path = %path.display(), "Frame written");

        self.written.fetch_add(1, Ordering::SeqCst);
        if index + 1 == self.limit {
            self.done.notify_one();
        }
        Ok(())
    }
}
