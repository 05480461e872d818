//! Synchronous publish/subscribe bus.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

use super::EventSink;
use crate::core::{EventKind, PipelineEvent};
use crate::errors::JobflowError;

/// A subscriber callback.
pub type Listener = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` subscribes to every kind.
    kind: Option<EventKind>,
    listener: Listener,
}

/// Maps event kinds to ordered subscriber lists.
///
/// Delivery is synchronous and follows subscription order. Listeners are
/// called without the internal lock held, so a listener may subscribe or
/// call back into the pipeline.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a listener to one event kind.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.push(Some(kind), Arc::new(listener))
    }

    /// Subscribes a sink to every event kind.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionId {
        self.push(None, Arc::new(move |event: &PipelineEvent| sink.emit(event)))
    }

    fn push(&self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.write().push(Subscription { id, kind, listener });
        id
    }

    /// Removes a subscription. Returns false if it was not found.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }

    /// Returns the number of listeners that would receive an event of `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == kind))
            .count()
    }

    fn listeners_for(&self, kind: EventKind) -> Vec<Listener> {
        let listeners: Vec<Listener> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.kind.map_or(true, |k| k == kind))
            .map(|s| Arc::clone(&s.listener))
            .collect();
        trace!(event = %kind, listeners = listeners.len(), "Emitting event");
        listeners
    }

    /// Delivers an event, stopping at the first listener that panics.
    ///
    /// The panic is returned as [`JobflowError::Panicked`]; listeners after
    /// the panicking one do not run.
    pub fn emit_checked(&self, event: &PipelineEvent) -> Result<(), JobflowError> {
        let kind = event.kind();
        for listener in self.listeners_for(kind) {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(event)))
                .map_err(|payload| {
                    JobflowError::panicked(format!("{kind} listener"), payload.as_ref())
                })?;
        }
        Ok(())
    }

    /// Delivers an event to its listeners in subscription order.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still run.
    pub fn emit(&self, event: &PipelineEvent) {
        let kind = event.kind();
        for listener in self.listeners_for(kind) {
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(event);
            })) {
                warn!(event = %kind, "Event listener panicked: {:?}", e);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.read().len())
            .finish()
    }
}
