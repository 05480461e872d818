//! # Jobflow
//!
//! A minimal sequential task pipeline.
//!
//! Jobflow runs an ordered queue of async tasks, each wrapped by pre- and
//! post-middleware hooks, and reports progress through lifecycle events:
//!
//! - **Single-use tasks**: each task transforms the current item and is
//!   removed from the queue once run
//! - **Middlewares**: reusable async observers that may end the run early
//! - **Events**: `pipelineStart`, `stepUpdate`, `completed`, `terminated`
//! - **Cooperative cancellation**: `complete()` and `terminate()` take effect
//!   at the next loop boundary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobflow::prelude::*;
//!
//! let pipeline = JobPipeline::new(PipelineConfig::new().with_debug(true));
//! pipeline.add_task_fn(|item| async move {
//!     Ok(PipelineItem::new(format!("{} processed by Task 1", item.payload), "task1"))
//! });
//! pipeline.on(EventKind::Completed, |event| println!("done: {:?}", event.item()));
//!
//! let outcome = pipeline.execute_pipeline("initial data").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LogTarget, PipelineConfig, PipelineOptions};
    pub use crate::core::{
        ContinuationState, EventKind, PipelineEvent, PipelineItem, RunOutcome,
        EVENT_COMPLETED, EVENT_ERROR, EVENT_PIPELINE_START, EVENT_STEP_UPDATE,
        EVENT_TERMINATED, STEP_START,
    };
    pub use crate::errors::{JobflowError, MiddlewarePhase, TerminationError};
    pub use crate::events::{
        CollectingEventSink, EventBus, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::observability::{LogSink, MemoryLogSink, StdoutLogSink, TracingLogSink};
    pub use crate::pipeline::{
        FnMiddleware, FnTask, JobPipeline, Middleware, PipelineHandle, Task,
    };
}
