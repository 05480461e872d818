//! Event sink trait and implementations.

use chrono::{DateTime, Utc};
use tracing::{debug, info, Level};

use crate::core::{EventKind, PipelineEvent};

/// Trait for sinks that observe every event a pipeline emits.
///
/// Delivery is synchronous, so implementations should return quickly and
/// must not block on the pipeline they observe.
pub trait EventSink: Send + Sync {
    /// Receives an event.
    fn emit(&self, event: &PipelineEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        let event_type = event.name();
        let data = event.data();
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        }
    }
}

/// An event as captured by [`CollectingEventSink`].
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    /// The event.
    pub event: PipelineEvent,
    /// When the sink received it.
    pub recorded_at: DateTime<Utc>,
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events with their timestamps.
    #[must_use]
    pub fn records(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().iter().map(|r| r.event.clone()).collect()
    }

    /// Returns the kinds of all collected events, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|r| r.event.kind()).collect()
    }

    /// Returns events of one kind.
    #[must_use]
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|r| r.event.kind() == kind)
            .map(|r| r.event.clone())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(RecordedEvent {
            event: event.clone(),
            recorded_at: Utc::now(),
        });
    }
}
