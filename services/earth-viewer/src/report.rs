//! Status, error and progress reporting.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

/// Glyphs of the progress bar.
const COMPLETED: char = '▪';
const REMAINING: char = '▫';
const BAR_LENGTH: usize = 22;

/// What the viewer currently reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    pub status: String,
    /// Set by [`Reporter::error`] and kept until [`Reporter::reset`].
    pub error: Option<String>,
    /// Fraction complete while a build is running.
    pub progress: Option<f64>,
}

/// Shared handle to the viewer's report line.
///
/// Errors are sticky: status messages are ignored until the next reset. Clones share
/// the same state.
#[derive(Debug, Clone)]
pub struct Reporter {
    state: Arc<watch::Sender<ReportState>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ReportState::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn status(&self, msg: &str) {
        let accepted = self.state.send_if_modified(|state| {
            if state.error.is_some() || state.status == msg {
                return false;
            }
            state.status = msg.to_string();
            true
        });
        if accepted && !msg.is_empty() {
            info!(status = msg, "Status");
        }
    }

    pub fn error(&self, err: &dyn Display) {
        let msg = err.to_string();
        error!(error = %msg, "Pipeline error");
        self.state.send_modify(|state| {
            state.status = msg.clone();
            state.error = Some(msg);
        });
    }

    /// Clear the status and any sticky error.
    pub fn reset(&self) {
        self.state.send_replace(ReportState::default());
    }

    /// Report `amount` complete. Values outside `[0, 1)` hide the progress bar.
    pub fn progress(&self, amount: f64) {
        let progress = (0.0..1.0).contains(&amount).then_some(amount);
        debug!(progress = amount, "Progress");
        self.state.send_modify(|state| state.progress = progress);
    }

    pub fn snapshot(&self) -> ReportState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every change.
    pub fn subscribe(&self) -> watch::Receiver<ReportState> {
        self.state.subscribe()
    }

    /// The progress bar, empty when no progress is shown.
    pub fn progress_bar(&self) -> String {
        match self.state.borrow().progress {
            Some(amount) => progress_bar(amount),
            None => String::new(),
        }
    }
}

/// Render `amount` as a bar of completed and remaining glyphs.
pub fn progress_bar(amount: f64) -> String {
    let done = ((amount.clamp(0.0, 1.0) * BAR_LENGTH as f64).ceil() as usize).min(BAR_LENGTH);
    std::iter::repeat(COMPLETED)
        .take(done)
        .chain(std::iter::repeat(REMAINING).take(BAR_LENGTH - done))
        .collect()
}
