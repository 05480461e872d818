//! Error types for the jobflow engine.
//!
//! Step faults raised by tasks and middlewares never escape
//! [`JobPipeline::execute_pipeline`](crate::pipeline::JobPipeline::execute_pipeline)
//! as an `Err`; they are converted into a termination and reported through
//! [`RunOutcome`](crate::core::RunOutcome). The remaining variants cover misuse
//! of the engine surface itself.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Message carried by every termination, manual or fault-triggered.
pub const MANUAL_TERMINATION_MESSAGE: &str = "Pipeline execution was manually terminated.";

/// The main error type for jobflow operations.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum JobflowError {
    /// A task returned an error.
    #[error("Task {index} failed: {message}")]
    Task {
        /// Zero-based position of the task in execution order for this run.
        index: usize,
        /// The rendered error chain.
        message: String,
    },

    /// A middleware returned an error.
    #[error("{phase} middleware failed: {message}")]
    Middleware {
        /// Which batch the middleware belonged to.
        phase: MiddlewarePhase,
        /// The rendered error chain.
        message: String,
    },

    /// A task or middleware panicked.
    #[error("{context} panicked: {message}")]
    Panicked {
        /// What was running when the panic happened.
        context: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The pipeline was terminated.
    #[error("{0}")]
    Terminated(#[from] TerminationError),

    /// An event name did not match any known event.
    #[error("Unknown event name: {0}")]
    UnknownEvent(String),

    /// A second run was started while one is in flight on the same engine.
    #[error("Pipeline is already running")]
    AlreadyRunning,

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl JobflowError {
    /// Creates a task error from a task's failure.
    #[must_use]
    pub fn task(index: usize, err: &anyhow::Error) -> Self {
        Self::Task {
            index,
            message: format!("{err:#}"),
        }
    }

    /// Creates a middleware error from a middleware's failure.
    #[must_use]
    pub fn middleware(phase: MiddlewarePhase, err: &anyhow::Error) -> Self {
        Self::Middleware {
            phase,
            message: format!("{err:#}"),
        }
    }

    /// Creates a panic error from a caught panic payload.
    #[must_use]
    pub fn panicked(context: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked {
            context: context.into(),
            message,
        }
    }

    /// Returns true for faults raised while running a step.
    #[must_use]
    pub fn is_step_fault(&self) -> bool {
        matches!(
            self,
            Self::Task { .. } | Self::Middleware { .. } | Self::Panicked { .. }
        )
    }

    /// Returns the underlying failure text without the step prefix.
    #[must_use]
    pub fn fault_message(&self) -> String {
        match self {
            Self::Task { message, .. }
            | Self::Middleware { message, .. }
            | Self::Panicked { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Task { index, .. } => {
                map.insert("type".to_string(), serde_json::json!("TaskError"));
                map.insert("index".to_string(), serde_json::json!(index));
            }
            Self::Middleware { phase, .. } => {
                map.insert("type".to_string(), serde_json::json!("MiddlewareError"));
                map.insert("phase".to_string(), serde_json::json!(phase));
            }
            Self::Panicked { context, .. } => {
                map.insert("type".to_string(), serde_json::json!("Panic"));
                map.insert("context".to_string(), serde_json::json!(context));
            }
            Self::Terminated(err) => {
                map.insert("type".to_string(), serde_json::json!("Terminated"));
                if let Some(ref cause) = err.cause {
                    map.insert("cause".to_string(), serde_json::json!(cause));
                }
            }
            Self::UnknownEvent(name) => {
                map.insert("type".to_string(), serde_json::json!("UnknownEvent"));
                map.insert("name".to_string(), serde_json::json!(name));
            }
            Self::AlreadyRunning => {
                map.insert("type".to_string(), serde_json::json!("AlreadyRunning"));
            }
            Self::InvalidConfig(_) => {
                map.insert("type".to_string(), serde_json::json!("InvalidConfig"));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// The middleware batch a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewarePhase {
    /// Runs before each task.
    Pre,
    /// Runs after each task.
    Post,
}

impl fmt::Display for MiddlewarePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => write!(f, "pre"),
            Self::Post => write!(f, "post"),
        }
    }
}

/// Error carried by the `terminated` event.
///
/// The message is always [`MANUAL_TERMINATION_MESSAGE`], so listeners see the
/// same error whether the run was cancelled or faulted. A fault-triggered
/// termination additionally carries the original failure in `cause`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct TerminationError {
    /// The termination message.
    pub message: String,
    /// The original fault message, when a step fault caused the termination.
    pub cause: Option<String>,
}

impl TerminationError {
    /// Creates the error emitted by a manual `terminate()`.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            message: MANUAL_TERMINATION_MESSAGE.to_string(),
            cause: None,
        }
    }

    /// Creates the error emitted when a step fault ends the run.
    #[must_use]
    pub fn from_fault(fault: &JobflowError) -> Self {
        Self {
            message: MANUAL_TERMINATION_MESSAGE.to_string(),
            cause: Some(fault.to_string()),
        }
    }

    /// Returns true if a step fault caused the termination.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.cause.is_some()
    }
}

impl Default for TerminationError {
    fn default() -> Self {
        Self::manual()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_error_renders_chain() {
        let err = anyhow::anyhow!("disk full").context("writing output");
        let err = JobflowError::task(2, &err);

        assert_eq!(err.to_string(), "Task 2 failed: writing output: disk full");
        assert!(err.is_step_fault());
    }

    #[test]
    fn test_fault_message_strips_step_prefix() {
        let err = JobflowError::task(0, &anyhow::anyhow!("exploded"));
        assert_eq!(err.fault_message(), "exploded");

        let err = JobflowError::middleware(MiddlewarePhase::Pre, &anyhow::anyhow!("closed"));
        assert_eq!(err.fault_message(), "closed");

        assert_eq!(
            JobflowError::AlreadyRunning.fault_message(),
            "Pipeline is already running"
        );
    }

    #[test]
    fn test_middleware_error_display() {
        let err = JobflowError::middleware(MiddlewarePhase::Post, &anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "post middleware failed: boom");
    }

    #[test]
    fn test_panicked_from_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("oops");
        let err = JobflowError::panicked("task 0", payload.as_ref());
        assert_eq!(err.to_string(), "task 0 panicked: oops");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let err = JobflowError::panicked("task 1", payload.as_ref());
        assert_eq!(err.to_string(), "task 1 panicked: owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u32);
        let err = JobflowError::panicked("task 2", payload.as_ref());
        assert!(err.to_string().contains("non-string"));
    }

    #[test]
    fn test_termination_error_manual() {
        let err = TerminationError::manual();
        assert_eq!(err.to_string(), MANUAL_TERMINATION_MESSAGE);
        assert!(!err.is_fault());
    }

    #[test]
    fn test_termination_error_keeps_message_for_faults() {
        let fault = JobflowError::task(0, &anyhow::anyhow!("bad input"));
        let err = TerminationError::from_fault(&fault);

        assert_eq!(err.to_string(), MANUAL_TERMINATION_MESSAGE);
        assert_eq!(err.cause.as_deref(), Some("Task 0 failed: bad input"));
    }

    #[test]
    fn test_error_to_dict() {
        let err = JobflowError::UnknownEvent("nope".to_string());
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "UnknownEvent");
        assert_eq!(dict.get("name").unwrap(), "nope");
        assert_eq!(dict.get("message").unwrap(), "Unknown event name: nope");
    }

    #[test]
    fn test_error_serialization() {
        let err = JobflowError::UnknownEvent("nope".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unknown_event", "detail": "nope"}));

        let back: JobflowError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_misuse_errors_are_not_step_faults() {
        assert!(!JobflowError::AlreadyRunning.is_step_fault());
        assert!(!JobflowError::Terminated(TerminationError::manual()).is_step_fault());
    }
}
