//! The item carried through a pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Step label given to the item a pipeline is seeded with.
pub const STEP_START: &str = "start";

/// The value flowing through a pipeline.
///
/// Each task receives the current item and returns a new one, which replaces
/// it wholesale. The `step` label records which stage produced the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineItem {
    /// The work product.
    pub payload: String,
    /// The stage that produced this value.
    #[serde(default = "default_step")]
    pub step: String,
}

fn default_step() -> String {
    STEP_START.to_string()
}

impl PipelineItem {
    /// Creates an item with an explicit step label.
    #[must_use]
    pub fn new(payload: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            step: step.into(),
        }
    }

    /// Creates the seed item for a run, labelled [`STEP_START`].
    #[must_use]
    pub fn seed(payload: impl Into<String>) -> Self {
        Self::new(payload, STEP_START)
    }

    /// Returns true if this is an unprocessed seed item.
    #[must_use]
    pub fn is_seed(&self) -> bool {
        self.step == STEP_START
    }
}

impl fmt::Display for PipelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.payload)
    }
}
