//! Assertions over events captured by a [`CollectingEventSink`].

use crate::core::{EventKind, PipelineEvent};
use crate::events::CollectingEventSink;

/// Asserts the exact sequence of event kinds.
pub fn assert_event_kinds(sink: &CollectingEventSink, expected: &[EventKind]) {
    let actual = sink.kinds();
    assert_eq!(
        actual, expected,
        "Expected events {:?}, got {:?}",
        expected, actual
    );
}

/// Asserts the payloads carried by `stepUpdate` events, in order.
pub fn assert_step_payloads(sink: &CollectingEventSink, expected: &[&str]) {
    let actual: Vec<String> = sink
        .events_of_kind(EventKind::StepUpdate)
        .iter()
        .filter_map(|e| e.item().map(|i| i.payload.clone()))
        .collect();
    assert_eq!(
        actual, expected,
        "Expected step payloads {:?}, got {:?}",
        expected, actual
    );
}

/// Asserts exactly one `completed` event was emitted with the given payload
/// (`None` for a manual `complete()`).
pub fn assert_completed_with(sink: &CollectingEventSink, expected: Option<&str>) {
    let completed = sink.events_of_kind(EventKind::Completed);
    assert_eq!(
        completed.len(),
        1,
        "Expected exactly one completed event, got {}",
        completed.len()
    );
    let actual = completed[0].item().map(|i| i.payload.as_str());
    assert_eq!(
        actual, expected,
        "Expected completed payload {:?}, got {:?}",
        expected, actual
    );
}

/// Asserts exactly one `terminated` event was emitted and returns whether it
/// carried a fault cause.
pub fn assert_terminated(sink: &CollectingEventSink) -> bool {
    let terminated = sink.events_of_kind(EventKind::Terminated);
    assert_eq!(
        terminated.len(),
        1,
        "Expected exactly one terminated event, got {}",
        terminated.len()
    );
    match &terminated[0] {
        PipelineEvent::Terminated(err) => err.is_fault(),
        other => panic!("Expected terminated event, got {other:?}"),
    }
}

/// Asserts no `completed` event was emitted.
pub fn assert_not_completed(sink: &CollectingEventSink) {
    let completed = sink.events_of_kind(EventKind::Completed);
    assert!(
        completed.is_empty(),
        "Expected no completed event, got {:?}",
        completed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineItem;
    use crate::errors::TerminationError;
    use crate::events::EventSink;

    fn sink_with(events: &[PipelineEvent]) -> CollectingEventSink {
        let sink = CollectingEventSink::new();
        for event in events {
            sink.emit(event);
        }
        sink
    }

    #[test]
    fn test_assert_event_kinds() {
        let sink = sink_with(&[
            PipelineEvent::PipelineStart(PipelineItem::seed("a")),
            PipelineEvent::Completed(None),
        ]);
        assert_event_kinds(&sink, &[EventKind::PipelineStart, EventKind::Completed]);
    }

    #[test]
    #[should_panic(expected = "Expected events")]
    fn test_assert_event_kinds_fails() {
        let sink = sink_with(&[PipelineEvent::Completed(None)]);
        assert_event_kinds(&sink, &[EventKind::Terminated]);
    }

    #[test]
    fn test_assert_step_payloads() {
        let sink = sink_with(&[
            PipelineEvent::StepUpdate(PipelineItem::new("a", "1")),
            PipelineEvent::StepUpdate(PipelineItem::new("b", "2")),
        ]);
        assert_step_payloads(&sink, &["a", "b"]);
    }

    #[test]
    fn test_assert_completed_with() {
        let sink = sink_with(&[PipelineEvent::Completed(Some(PipelineItem::seed("done")))]);
        assert_completed_with(&sink, Some("done"));

        let sink = sink_with(&[PipelineEvent::Completed(None)]);
        assert_completed_with(&sink, None);
    }

    #[test]
    fn test_assert_terminated() {
        let sink = sink_with(&[PipelineEvent::Terminated(TerminationError::manual())]);
        assert!(!assert_terminated(&sink));
        assert_not_completed(&sink);
    }
}
