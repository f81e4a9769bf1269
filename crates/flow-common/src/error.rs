//! Error types for the earth-flow pipeline.

use thiserror::Error;

/// Result type alias using FlowError.
pub type FlowResult<T> = Result<T, FlowError>;

/// Primary error type for field building, animation and rendering.
#[derive(Debug, Error)]
pub enum FlowError {
    // === Input Errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Computation Errors ===
    #[error("Mask rasterization failed: {0}")]
    Mask(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Projection error: {0}")]
    Projection(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    /// The task observed its cancellation token. Never surfaced to users.
    #[error("Task cancelled")]
    Cancelled,
}

impl FlowError {
    /// True when this error only signals cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FlowError::Cancelled)
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Json(err.to_string())
    }
}
