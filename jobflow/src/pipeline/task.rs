//! Task trait and closure adapter.

use async_trait::async_trait;
use std::future::Future;

use crate::core::PipelineItem;

/// A single-use transformation step.
///
/// A task receives the current item and returns the item that replaces it.
/// Returning an error ends the run with a termination.
#[async_trait]
pub trait Task: Send + Sync {
    /// Returns a label used in logs.
    fn name(&self) -> &str {
        "task"
    }

    /// Transforms the item.
    async fn run(&self, item: PipelineItem) -> anyhow::Result<PipelineItem>;
}

/// A task backed by an async closure.
pub struct FnTask<F> {
    name: String,
    func: F,
}

impl<F> FnTask<F> {
    /// Creates a task labelled `"task"`.
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync,
        Fut: Future<Output = anyhow::Result<PipelineItem>> + Send,
    {
        Self::named("task", func)
    }

    /// Creates a task with a label.
    pub fn named<Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync,
        Fut: Future<Output = anyhow::Result<PipelineItem>> + Send,
    {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> std::fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F>
where
    F: Fn(PipelineItem) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<PipelineItem>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, item: PipelineItem) -> anyhow::Result<PipelineItem> {
        (self.func)(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_task() {
        let task = FnTask::named("upper", |item: PipelineItem| async move {
            Ok(PipelineItem::new(item.payload.to_uppercase(), "upper"))
        });

        assert_eq!(task.name(), "upper");

        let out = task.run(PipelineItem::seed("abc")).await.unwrap();
        assert_eq!(out, PipelineItem::new("ABC", "upper"));
    }

    #[test]
    fn test_fn_task_blocking() {
        let task = FnTask::new(|item: PipelineItem| async move { Ok(item) });
        let out = tokio_test::block_on(task.run(PipelineItem::seed("same"))).unwrap();
        assert_eq!(out, PipelineItem::seed("same"));
    }

    #[tokio::test]
    async fn test_fn_task_error() {
        let task = FnTask::new(|_item: PipelineItem| async move { anyhow::bail!("nope") });

        assert_eq!(task.name(), "task");
        assert!(task.run(PipelineItem::seed("x")).await.is_err());
    }
}
