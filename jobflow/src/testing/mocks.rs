//! Mock tasks and middlewares for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::PipelineItem;
use crate::pipeline::{Middleware, PipelineHandle, Task};

/// A task that appends a suffix to the payload and relabels the step.
#[derive(Debug, Clone)]
pub struct AppendTask {
    suffix: String,
    step: String,
    calls: Arc<AtomicUsize>,
}

impl AppendTask {
    /// Creates a new append task.
    #[must_use]
    pub fn new(suffix: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            step: step.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a counter shared by every clone of this task.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Task for AppendTask {
    fn name(&self) -> &str {
        &self.step
    }

    async fn run(&self, item: PipelineItem) -> anyhow::Result<PipelineItem> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PipelineItem::new(
            format!("{}{}", item.payload, self.suffix),
            self.step.clone(),
        ))
    }
}

/// A task that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingTask {
    message: String,
}

impl FailingTask {
    /// Creates a new failing task.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Task for FailingTask {
    async fn run(&self, _item: PipelineItem) -> anyhow::Result<PipelineItem> {
        anyhow::bail!("{}", self.message)
    }
}

/// A task that panics.
#[derive(Debug, Clone, Default)]
pub struct PanickingTask;

#[async_trait]
impl Task for PanickingTask {
    async fn run(&self, _item: PipelineItem) -> anyhow::Result<PipelineItem> {
        panic!("task panicked on purpose")
    }
}

/// A task that sleeps before appending a suffix.
#[derive(Debug, Clone)]
pub struct SlowTask {
    delay: Duration,
    inner: AppendTask,
}

impl SlowTask {
    /// Creates a new slow task.
    #[must_use]
    pub fn new(delay: Duration, suffix: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            delay,
            inner: AppendTask::new(suffix, step),
        }
    }
}

#[async_trait]
impl Task for SlowTask {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, item: PipelineItem) -> anyhow::Result<PipelineItem> {
        tokio::time::sleep(self.delay).await;
        self.inner.run(item).await
    }
}

/// A middleware that records every item it sees.
#[derive(Debug, Clone, Default)]
pub struct RecordingMiddleware {
    seen: Arc<Mutex<Vec<PipelineItem>>>,
}

impl RecordingMiddleware {
    /// Creates a new recording middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the items seen so far. Clones share the same record.
    #[must_use]
    pub fn seen(&self) -> Vec<PipelineItem> {
        self.seen.lock().clone()
    }

    /// Returns the payloads seen so far.
    #[must_use]
    pub fn payloads(&self) -> Vec<String> {
        self.seen.lock().iter().map(|i| i.payload.clone()).collect()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl Middleware for RecordingMiddleware {
    async fn call(&self, item: &PipelineItem) -> anyhow::Result<()> {
        self.seen.lock().push(item.clone());
        Ok(())
    }
}

/// A middleware that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingMiddleware {
    message: String,
}

impl FailingMiddleware {
    /// Creates a new failing middleware.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Middleware for FailingMiddleware {
    async fn call(&self, _item: &PipelineItem) -> anyhow::Result<()> {
        anyhow::bail!("{}", self.message)
    }
}

/// What a [`HaltingMiddleware`] does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltAction {
    /// Call `complete()`.
    Complete,
    /// Call `terminate()`.
    Terminate,
}

/// A middleware that halts the pipeline on its nth call (1-based).
#[derive(Debug)]
pub struct HaltingMiddleware {
    handle: PipelineHandle,
    action: HaltAction,
    fire_on: usize,
    calls: AtomicUsize,
}

impl HaltingMiddleware {
    /// Creates a middleware that fires on its first call.
    #[must_use]
    pub fn new(handle: PipelineHandle, action: HaltAction) -> Self {
        Self::on_call(handle, action, 1)
    }

    /// Creates a middleware that fires on call number `fire_on`.
    #[must_use]
    pub fn on_call(handle: PipelineHandle, action: HaltAction, fire_on: usize) -> Self {
        Self {
            handle,
            action,
            fire_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Middleware for HaltingMiddleware {
    async fn call(&self, _item: &PipelineItem) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fire_on {
            match self.action {
                HaltAction::Complete => self.handle.complete(),
                HaltAction::Terminate => self.handle.terminate(),
            }
        }
        Ok(())
    }
}
