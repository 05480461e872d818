//! Lifecycle events emitted by a pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PipelineItem;
use crate::errors::{JobflowError, TerminationError};

/// Name of the event emitted once when a run starts.
pub const EVENT_PIPELINE_START: &str = "pipelineStart";
/// Name of the event emitted after each executed task.
pub const EVENT_STEP_UPDATE: &str = "stepUpdate";
/// Name of the reserved error event. The engine never emits it.
pub const EVENT_ERROR: &str = "error";
/// Name of the completion event.
pub const EVENT_COMPLETED: &str = "completed";
/// Name of the termination event.
pub const EVENT_TERMINATED: &str = "terminated";

/// The kind of a [`PipelineEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Run started.
    #[serde(rename = "pipelineStart")]
    PipelineStart,
    /// A task produced a new item.
    #[serde(rename = "stepUpdate")]
    StepUpdate,
    /// Reserved for consumers.
    #[serde(rename = "error")]
    Error,
    /// Run completed.
    #[serde(rename = "completed")]
    Completed,
    /// Run terminated.
    #[serde(rename = "terminated")]
    Terminated,
}

impl EventKind {
    /// All event kinds, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::PipelineStart,
        Self::StepUpdate,
        Self::Error,
        Self::Completed,
        Self::Terminated,
    ];

    /// Returns the stable event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PipelineStart => EVENT_PIPELINE_START,
            Self::StepUpdate => EVENT_STEP_UPDATE,
            Self::Error => EVENT_ERROR,
            Self::Completed => EVENT_COMPLETED,
            Self::Terminated => EVENT_TERMINATED,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = JobflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| JobflowError::UnknownEvent(s.to_string()))
    }
}

/// A notification delivered to subscribers during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// The run started with this seed item.
    PipelineStart(PipelineItem),
    /// A task produced this item.
    StepUpdate(PipelineItem),
    /// Reserved; never emitted by the engine.
    Error(JobflowError),
    /// The run completed. Carries the final item on natural completion and
    /// nothing when `complete()` was called.
    Completed(Option<PipelineItem>),
    /// The run was terminated.
    Terminated(TerminationError),
}

impl PipelineEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PipelineStart(_) => EventKind::PipelineStart,
            Self::StepUpdate(_) => EventKind::StepUpdate,
            Self::Error(_) => EventKind::Error,
            Self::Completed(_) => EventKind::Completed,
            Self::Terminated(_) => EventKind::Terminated,
        }
    }

    /// Returns the stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns the item carried by the event, if any.
    #[must_use]
    pub fn item(&self) -> Option<&PipelineItem> {
        match self {
            Self::PipelineStart(item) | Self::StepUpdate(item) => Some(item),
            Self::Completed(item) => item.as_ref(),
            Self::Error(_) | Self::Terminated(_) => None,
        }
    }

    /// Converts the event payload to JSON for logging sinks.
    #[must_use]
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::PipelineStart(item) | Self::StepUpdate(item) => serde_json::to_value(item).ok(),
            Self::Completed(item) => item.as_ref().and_then(|i| serde_json::to_value(i).ok()),
            Self::Error(err) => Some(serde_json::json!(err.to_dict())),
            Self::Terminated(err) => serde_json::to_value(err).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(EventKind::PipelineStart.as_str(), "pipelineStart");
        assert_eq!(EventKind::StepUpdate.as_str(), "stepUpdate");
        assert_eq!(EventKind::Error.as_str(), "error");
        assert_eq!(EventKind::Completed.as_str(), "completed");
        assert_eq!(EventKind::Terminated.as_str(), "terminated");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("stepUpdate".parse::<EventKind>().unwrap(), EventKind::StepUpdate);
        assert!(matches!(
            "step_update".parse::<EventKind>(),
            Err(JobflowError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_event_item() {
        let item = PipelineItem::seed("x");
        assert_eq!(PipelineEvent::StepUpdate(item.clone()).item(), Some(&item));
        assert_eq!(PipelineEvent::Completed(None).item(), None);
        assert_eq!(
            PipelineEvent::Terminated(TerminationError::manual()).kind(),
            EventKind::Terminated
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::StepUpdate(PipelineItem::new("a", "task1"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "stepUpdate");
        assert_eq!(json["data"]["payload"], "a");

        let back: PipelineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_completed_without_item_has_no_data() {
        assert!(PipelineEvent::Completed(None).data().is_none());
        assert!(PipelineEvent::Terminated(TerminationError::manual()).data().is_some());
    }
}
