//! Middleware trait and the ordered chain that holds them.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;

use crate::core::PipelineItem;

/// An observer or gate run before or after every task.
///
/// Middlewares see the current item but cannot replace it. They may call
/// `complete()` or `terminate()` through a
/// [`PipelineHandle`](super::PipelineHandle) to end the run.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs against the current item.
    async fn call(&self, item: &PipelineItem) -> anyhow::Result<()>;
}

/// A middleware backed by an async closure.
///
/// The closure receives a clone of the item.
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps a closure.
    pub fn new<Fut>(func: F) -> Self
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync,
        Fut: Future<Output = anyhow::Result<()>> + Send,
    {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(PipelineItem) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn call(&self, item: &PipelineItem) -> anyhow::Result<()> {
        (self.func)(item.clone()).await
    }
}

/// An ordered, reusable list of middlewares.
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    /// Creates a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    pub fn add(&self, middleware: Arc<dyn Middleware>) {
        self.middlewares.write().push(middleware);
    }

    /// Returns the middlewares as they are now.
    ///
    /// A batch iterates this copy, so additions made while it runs apply to
    /// the next batch.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares.read().clone()
    }

    /// Returns the number of middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.read().len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.read().is_empty()
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_middleware_sees_item() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = seen.clone();
        let mw = FnMiddleware::new(move |item: PipelineItem| {
            let seen = seen_clone.clone();
            async move {
                *seen.lock() = Some(item.payload);
                Ok(())
            }
        });

        mw.call(&PipelineItem::seed("peek")).await.unwrap();
        assert_eq!(seen.lock().as_deref(), Some("peek"));
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let chain = MiddlewareChain::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        chain.add(Arc::new(FnMiddleware::new(move |_item: PipelineItem| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })));

        let snapshot = chain.snapshot();
        chain.add(Arc::new(FnMiddleware::new(|_item: PipelineItem| async { Ok(()) })));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(chain.len(), 2);

        for mw in snapshot {
            mw.call(&PipelineItem::seed("x")).await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
