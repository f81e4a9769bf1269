//! Task agents.
//!
//! An [`Agent`] runs at most one task at a time. Submitting a task cancels the previous
//! one, and the agent announces each task's lifecycle on an [`EventBus`]:
//!
//! - `Submit` when the task starts
//! - `Update(value)` when it completes and was not cancelled
//! - `Reject(error)` when it fails and was not cancelled
//! - `Fail(error)` when an observer of one of the above returned an error
//!
//! Cancelled tasks settle silently.

pub mod agent;
pub mod bus;
pub mod error;

pub use agent::{Agent, AgentEvent, CancelCheck, TaskInput};
pub use bus::{EventBus, ObserverError, SubscriptionId};
pub use error::{AgentError, AgentResult};
