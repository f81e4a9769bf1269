//! Cancellable single-slot task runner.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{AgentError, EventBus};

/// Lifecycle events published by an [`Agent`].
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent<T> {
    /// A task was accepted and started.
    Submit,
    /// A task completed; its value is now the agent's value.
    Update(T),
    /// A task or its input failed.
    Reject(AgentError),
    /// An observer failed while handling one of the events above.
    Fail(AgentError),
}

/// Read-only view of a task's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelCheck {
    token: CancellationToken,
}

impl CancelCheck {
    /// A check that is only cancelled by its owner dropping out of scope, for running
    /// task bodies outside an agent.
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the task has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl From<CancellationToken> for CancelCheck {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}

/// Argument of a task, either available now or produced by another computation.
pub enum TaskInput<A> {
    Ready(A),
    Pending(BoxFuture<'static, Result<A, AgentError>>),
}

impl<A> TaskInput<A> {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<A, AgentError>> + Send + 'static,
    {
        TaskInput::Pending(Box::pin(future))
    }

    async fn resolve(self) -> Result<A, AgentError> {
        match self {
            TaskInput::Ready(value) => Ok(value),
            TaskInput::Pending(future) => future.await,
        }
    }
}

impl<A> From<A> for TaskInput<A> {
    fn from(value: A) -> Self {
        TaskInput::Ready(value)
    }
}

struct Slot<T> {
    value: T,
    token: CancellationToken,
    generation: u64,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    bus: EventBus<AgentEvent<T>>,
}

/// Runs at most one task at a time and keeps the last accepted result.
///
/// Cloning yields another handle to the same agent.
pub struct Agent<T> {
    name: Arc<str>,
    shared: Arc<Shared<T>>,
}

impl<T> Agent<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self::with_bus(initial, EventBus::new())
    }

    /// Create an agent that publishes on an existing bus.
    pub fn with_bus(initial: T, bus: EventBus<AgentEvent<T>>) -> Self {
        let token = CancellationToken::new();
        // Nothing is running yet
        token.cancel();
        Self {
            name: Arc::from("agent"),
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    value: initial,
                    token,
                    generation: 0,
                }),
                bus,
            }),
        }
    }

    /// Name used in logs and metrics.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Arc::from(name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> &EventBus<AgentEvent<T>> {
        &self.shared.bus
    }

    /// The last accepted result, or the initial value.
    pub fn value(&self) -> T {
        self.slot().value.clone()
    }

    /// Number of tasks submitted so far.
    pub fn generation(&self) -> u64 {
        self.slot().generation
    }

    /// Cancel the current task, if any. Idempotent.
    pub fn cancel(&self) {
        let slot = self.slot();
        if !slot.token.is_cancelled() {
            debug!(agent = %self.name, generation = slot.generation, "Cancelling task");
            slot.token.cancel();
        }
    }

    /// Whether the current generation has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.slot().token.is_cancelled()
    }

    /// Cancel any running task and schedule `task`.
    pub fn submit<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce(CancelCheck) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AgentError>> + Send + 'static,
    {
        self.submit_with(TaskInput::Ready(()), move |(), cancel| task(cancel))
    }

    /// Cancel any running task and schedule `task` on the resolved `input`.
    ///
    /// The task starts at the end of the current scheduling turn; if another task is
    /// submitted first, this one never starts and publishes nothing.
    pub fn submit_with<A, F, Fut>(&self, input: TaskInput<A>, task: F) -> JoinHandle<()>
    where
        A: Send + 'static,
        F: FnOnce(A, CancelCheck) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AgentError>> + Send + 'static,
    {
        let (token, generation) = {
            let mut slot = self.slot();
            slot.token.cancel();
            slot.token = CancellationToken::new();
            slot.generation += 1;
            (slot.token.clone(), slot.generation)
        };

        let agent = self.clone();
        tokio::spawn(async move { agent.run(token, generation, input, task).await })
    }

    async fn run<A, F, Fut>(
        self,
        token: CancellationToken,
        generation: u64,
        input: TaskInput<A>,
        task: F,
    ) where
        F: FnOnce(A, CancelCheck) -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        tokio::task::yield_now().await;
        if token.is_cancelled() {
            debug!(agent = %self.name, generation, "Task superseded before start");
            return;
        }

        self.publish(AgentEvent::Submit);

        let result = match input.resolve().await {
            Ok(arg) if token.is_cancelled() => {
                drop(arg);
                Err(AgentError::Cancelled)
            }
            Ok(arg) => task(arg, CancelCheck::from(token.clone())).await,
            Err(err) => Err(err),
        };

        self.settle(&token, generation, result);
    }

    fn settle(&self, token: &CancellationToken, generation: u64, result: Result<T, AgentError>) {
        match result {
            Ok(value) => {
                {
                    let mut slot = self.slot();
                    if token.is_cancelled() {
                        debug!(
                            agent = %self.name,
                            generation,
                            "Discarding result of cancelled task"
                        );
                        return;
                    }
                    slot.value = value.clone();
                }
                self.publish(AgentEvent::Update(value));
            }
            Err(err) => {
                if token.is_cancelled() || err.is_cancelled() {
                    debug!(agent = %self.name, generation, error = %err, "Cancelled task failed");
                    return;
                }
                warn!(agent = %self.name, generation, error = %err, "Task rejected");
                counter!("agent_rejections_total", "agent" => self.name.to_string()).increment(1);
                self.publish(AgentEvent::Reject(err));
            }
        }
    }

    fn publish(&self, event: AgentEvent<T>) {
        for failure in self.shared.bus.publish(&event) {
            warn!(agent = %self.name, error = %failure.error, "Observer failed");
            let fail = AgentEvent::Fail(AgentError::Observer(failure.error.to_string()));
            for nested in self.shared.bus.publish(&fail) {
                error!(agent = %self.name, error = %nested.error, "Observer of fail event failed");
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot<T>> {
        self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for Agent<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Agent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent").field("name", &self.name).finish()
    }
}
