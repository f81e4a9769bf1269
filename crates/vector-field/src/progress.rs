//! Progress reporting for long-running builds.

/// Receives the fraction of work done, in `[0, 1]`.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, amount: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn progress(&self, amount: f64) {
        self(amount)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&self, _amount: f64) {}
}
