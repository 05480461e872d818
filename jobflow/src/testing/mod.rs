//! Testing utilities for jobflow pipelines.
//!
//! This module provides:
//! - Mock tasks and middlewares
//! - Assertions over collected events

mod assertions;
mod mocks;

pub use assertions::{
    assert_completed_with, assert_event_kinds, assert_not_completed, assert_step_payloads,
    assert_terminated,
};
pub use mocks::{
    AppendTask, FailingMiddleware, FailingTask, HaltAction, HaltingMiddleware, PanickingTask,
    RecordingMiddleware, SlowTask,
};
