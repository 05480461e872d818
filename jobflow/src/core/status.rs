//! Continuation state and run outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PipelineItem;
use crate::errors::JobflowError;

/// Whether the run loop may keep popping tasks.
///
/// Starts as `Continue`. `complete()` and `terminate()` move it to a halted
/// state, which is only checked at loop boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationState {
    /// The loop proceeds.
    Continue,
    /// Halted by `complete()`.
    Completed,
    /// Halted by `terminate()` or a step fault.
    Terminated,
}

impl Default for ContinuationState {
    fn default() -> Self {
        Self::Continue
    }
}

impl fmt::Display for ContinuationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Completed => write!(f, "completed"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

impl ContinuationState {
    /// Returns true if the loop may proceed.
    #[must_use]
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Returns true if the run was halted early.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        !self.should_continue()
    }
}

/// How a call to `execute_pipeline` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The task queue drained while the state was `Continue`.
    Drained {
        /// The final item.
        item: PipelineItem,
        /// Number of tasks executed in this run.
        steps: usize,
    },
    /// The run stopped because `complete()` was called.
    Completed {
        /// The item current when the loop exited.
        item: PipelineItem,
        /// Number of tasks executed in this run.
        steps: usize,
    },
    /// The run stopped because `terminate()` was called or a step faulted.
    Terminated {
        /// The item current when the loop exited.
        item: PipelineItem,
        /// Number of tasks executed in this run.
        steps: usize,
        /// The fault that ended the run, if any.
        cause: Option<JobflowError>,
    },
}

impl RunOutcome {
    /// Returns the item current when the run ended.
    #[must_use]
    pub fn item(&self) -> &PipelineItem {
        match self {
            Self::Drained { item, .. } | Self::Completed { item, .. } | Self::Terminated { item, .. } => item,
        }
    }

    /// Returns the number of tasks executed in the run.
    #[must_use]
    pub fn steps(&self) -> usize {
        match self {
            Self::Drained { steps, .. } | Self::Completed { steps, .. } | Self::Terminated { steps, .. } => *steps,
        }
    }

    /// Returns true unless the run was terminated.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Terminated { .. })
    }

    /// Returns the fault that terminated the run, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&JobflowError> {
        match self {
            Self::Terminated { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }

    /// Returns true if a step fault terminated the run.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.cause().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_default_continues() {
        let state = ContinuationState::default();
        assert!(state.should_continue());
        assert!(!state.is_halted());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ContinuationState::Continue.to_string(), "continue");
        assert_eq!(ContinuationState::Completed.to_string(), "completed");
        assert_eq!(ContinuationState::Terminated.to_string(), "terminated");
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&ContinuationState::Terminated).unwrap();
        assert_eq!(json, r#""terminated""#);
    }

    #[test]
    fn test_outcome_accessors() {
        let fault = JobflowError::task(1, &anyhow::anyhow!("bad"));
        let outcome = RunOutcome::Terminated {
            item: PipelineItem::seed("x"),
            steps: 1,
            cause: Some(fault.clone()),
        };

        assert!(!outcome.is_success());
        assert!(outcome.is_fault());
        assert_eq!(outcome.cause(), Some(&fault));
        assert_eq!(outcome.steps(), 1);
        assert_eq!(outcome.item().payload, "x");
    }

    #[test]
    fn test_completed_outcome_is_success() {
        let outcome = RunOutcome::Completed {
            item: PipelineItem::seed("x"),
            steps: 0,
        };
        assert!(outcome.is_success());
        assert!(outcome.cause().is_none());
    }
}
