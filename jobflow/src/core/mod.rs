//! Core types for jobflow.
//!
//! This module provides the fundamental types used throughout the engine:
//! - PipelineItem: the value carried from task to task
//! - ContinuationState and RunOutcome: run-loop control and results
//! - PipelineEvent and EventKind: lifecycle notifications

mod event;
mod item;
mod status;

pub use event::{
    EventKind, PipelineEvent, EVENT_COMPLETED, EVENT_ERROR, EVENT_PIPELINE_START,
    EVENT_STEP_UPDATE, EVENT_TERMINATED,
};
pub use item::{PipelineItem, STEP_START};
pub use status::{ContinuationState, RunOutcome};
