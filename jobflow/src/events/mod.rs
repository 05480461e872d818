//! Event publication for pipeline runs.
//!
//! This module provides the publish/subscribe bus the engine emits lifecycle
//! events on, plus sinks that observe every event.

mod bus;
mod sink;

pub use bus::{EventBus, Listener, SubscriptionId};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
