//! Synchronous publish/subscribe hub.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::AgentError;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An error returned by one observer during [`EventBus::publish`].
#[derive(Debug, Clone)]
pub struct ObserverError {
    pub subscription: SubscriptionId,
    pub error: AgentError,
}

type Observer<E> = Arc<dyn Fn(&E) -> Result<(), AgentError> + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer<E>)>,
}

/// Delivers events to observers in registration order.
///
/// Cloning yields another handle to the same observers. Observers run on the
/// publisher's task, outside the bus lock, so they may subscribe, unsubscribe, or publish
/// further events themselves.
pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&E) -> Result<(), AgentError> + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.observers.len();
        registry.observers.retain(|(other, _)| *other != id);
        registry.observers.len() != before
    }

    /// Deliver `event` to every observer, collecting their errors.
    ///
    /// A failing observer does not stop delivery to the rest.
    pub fn publish(&self, event: &E) -> Vec<ObserverError> {
        let observers: Vec<(SubscriptionId, Observer<E>)> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .clone();

        observers
            .into_iter()
            .filter_map(|(subscription, observer)| {
                observer(event)
                    .err()
                    .map(|error| ObserverError { subscription, error })
            })
            .collect()
    }

    pub fn observer_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observer_count())
            .finish()
    }
}
