//! Pipeline building and execution.
//!
//! This module provides:
//! - The `JobPipeline` engine and its `PipelineHandle`
//! - Task and middleware traits with closure adapters
//! - The single-use task queue and middleware chains

mod engine;
mod handle;
mod middleware;
mod queue;
mod task;


pub use engine::JobPipeline;
pub use handle::PipelineHandle;
pub use middleware::{FnMiddleware, Middleware, MiddlewareChain};
pub use queue::TaskQueue;
pub use task::{FnTask, Task};
