//! Weak control handle for a running pipeline.

use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::trace;

use super::engine::PipelineShared;
use super::{FnMiddleware, FnTask, Middleware, Task};
use crate::core::{ContinuationState, PipelineItem};
use crate::errors::MiddlewarePhase;

/// A cloneable handle to a [`JobPipeline`](super::JobPipeline).
///
/// Tasks and middlewares capture a handle to end the run early or queue more
/// work. The handle does not keep the pipeline alive; once the pipeline is
/// dropped every call is a no-op.
#[derive(Clone)]
pub struct PipelineHandle {
    shared: Weak<PipelineShared>,
}

impl PipelineHandle {
    pub(crate) fn new(shared: Weak<PipelineShared>) -> Self {
        Self { shared }
    }

    fn with<R>(&self, op: &str, f: impl FnOnce(&PipelineShared) -> R) -> Option<R> {
        let shared = self.shared.upgrade();
        if shared.is_none() {
            trace!(op, "Pipeline dropped, ignoring handle call");
        }
        shared.as_deref().map(f)
    }

    /// Returns true while the pipeline still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Calls `complete()` on the pipeline.
    pub fn complete(&self) {
        self.with("complete", PipelineShared::complete);
    }

    /// Calls `terminate()` on the pipeline.
    pub fn terminate(&self) {
        self.with("terminate", PipelineShared::terminate);
    }

    /// Returns the pipeline's continuation state, if it still exists.
    #[must_use]
    pub fn state(&self) -> Option<ContinuationState> {
        self.with("state", PipelineShared::state)
    }

    /// Appends a task. A running loop picks it up if it has not yet drained
    /// the queue.
    pub fn add_task<T: Task + 'static>(&self, task: T) {
        self.with("add_task", |shared| shared.push_task(Box::new(task)));
    }

    /// Appends a closure task.
    pub fn add_task_fn<F, Fut>(&self, func: F)
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PipelineItem>> + Send + 'static,
    {
        self.add_task(FnTask::new(func));
    }

    /// Appends a middleware to a batch. It takes effect from the next batch.
    pub fn add_middleware<M: Middleware + 'static>(&self, phase: MiddlewarePhase, middleware: M) {
        self.with("add_middleware", |shared| {
            shared.chain(phase).add(Arc::new(middleware));
        });
    }

    /// Appends a closure middleware to a batch.
    pub fn add_middleware_fn<F, Fut>(&self, phase: MiddlewarePhase, func: F)
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_middleware(phase, FnMiddleware::new(func));
    }
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::JobPipeline;
    use crate::core::ContinuationState;
    use crate::errors::MiddlewarePhase;

    #[test]
    fn test_handle_controls_pipeline() {
        let pipeline = JobPipeline::default();
        let handle = pipeline.handle();

        assert!(handle.is_alive());
        assert_eq!(handle.state(), Some(ContinuationState::Continue));

        handle.terminate();
        assert_eq!(pipeline.state(), ContinuationState::Terminated);

        handle.complete();
        assert_eq!(pipeline.state(), ContinuationState::Completed);
    }

    #[test]
    fn test_handle_registers_work() {
        let pipeline = JobPipeline::default();
        let handle = pipeline.handle();

        handle.add_task_fn(|item| async move { Ok(item) });
        handle.add_middleware_fn(MiddlewarePhase::Post, |_item| async { Ok(()) });

        assert_eq!(pipeline.pending_tasks(), 1);
        assert_eq!(pipeline.middleware_count(MiddlewarePhase::Post), 1);
    }

    #[test]
    fn test_handle_after_drop_is_noop() {
        let pipeline = JobPipeline::default();
        let handle = pipeline.handle();
        drop(pipeline);

        assert!(!handle.is_alive());
        assert_eq!(handle.state(), None);
        handle.terminate();
        handle.add_task_fn(|item| async move { Ok(item) });
    }
}
