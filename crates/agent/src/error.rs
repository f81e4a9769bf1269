//! Agent error types.

use flow_common::FlowError;
use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    /// The task body failed.
    #[error("Task failed: {0}")]
    Task(String),

    /// The task's input could not be resolved.
    #[error("Task input failed: {0}")]
    Input(String),

    /// An observer returned an error while handling an event.
    #[error("Observer failed: {0}")]
    Observer(String),

    /// The task saw its cancellation signal.
    #[error("Task cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

impl From<FlowError> for AgentError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Cancelled => AgentError::Cancelled,
            other => AgentError::Task(other.to_string()),
        }
    }
}
