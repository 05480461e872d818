//! The sequential pipeline engine.

use futures::FutureExt;
use parking_lot::RwLock;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{FnMiddleware, FnTask, Middleware, MiddlewareChain, PipelineHandle, Task, TaskQueue};
use crate::config::PipelineConfig;
use crate::core::{ContinuationState, EventKind, PipelineEvent, PipelineItem, RunOutcome};
use crate::errors::{JobflowError, MiddlewarePhase, TerminationError};
use crate::events::{EventBus, EventSink, SubscriptionId};

/// State shared between a [`JobPipeline`] and its handles.
pub(crate) struct PipelineShared {
    tasks: TaskQueue,
    pre_middlewares: MiddlewareChain,
    post_middlewares: MiddlewareChain,
    state: RwLock<ContinuationState>,
    running: AtomicBool,
    events: EventBus,
    config: PipelineConfig,
}

impl PipelineShared {
    fn log(&self, message: &str) {
        if self.config.debug_enabled {
            self.config.log_sink.log(message);
        }
    }

    pub(crate) fn state(&self) -> ContinuationState {
        *self.state.read()
    }

    pub(crate) fn push_task(&self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    pub(crate) fn chain(&self, phase: MiddlewarePhase) -> &MiddlewareChain {
        match phase {
            MiddlewarePhase::Pre => &self.pre_middlewares,
            MiddlewarePhase::Post => &self.post_middlewares,
        }
    }

    pub(crate) fn complete(&self) {
        *self.state.write() = ContinuationState::Completed;
        info!("Pipeline completion requested");
        self.events.emit(&PipelineEvent::Completed(None));
        self.log("Pipeline execution completed.");
    }

    pub(crate) fn terminate(&self) {
        self.terminate_with(TerminationError::manual());
    }

    fn terminate_with(&self, error: TerminationError) {
        *self.state.write() = ContinuationState::Terminated;
        info!(fault = error.is_fault(), "Pipeline termination requested");
        self.events.emit(&PipelineEvent::Terminated(error));
        self.log("Pipeline execution was manually terminated.");
    }

    async fn execute_middlewares(
        &self,
        phase: MiddlewarePhase,
        item: &PipelineItem,
    ) -> Result<(), JobflowError> {
        self.log(&format!("Starting middlewares for step {}", item.step));
        for middleware in self.chain(phase).snapshot() {
            catch_fault(
                middleware.call(item),
                |e| JobflowError::middleware(phase, e),
                || format!("{phase} middleware"),
            )
            .await?;
            self.log(&format!("Middleware completed for step {}", item.step));
        }
        Ok(())
    }

    async fn run(&self, seed: String) -> RunOutcome {
        let mut current = PipelineItem::seed(seed);
        let mut steps = 0;

        self.log("Starting pipeline execution.");
        info!(pending_tasks = self.tasks.len(), state = %self.state(), "Pipeline started");
        self.events.emit(&PipelineEvent::PipelineStart(current.clone()));

        let result = match self.run_loop(&mut current, &mut steps).await {
            Ok(()) if self.state().should_continue() => self.finish_drained(&current),
            other => other,
        };

        if let Err(fault) = result {
            warn!(error = %fault, steps, "Pipeline step failed");
            self.terminate_with(TerminationError::from_fault(&fault));
            self.log(&format!("Pipeline execution error: {}", fault.fault_message()));
            return RunOutcome::Terminated {
                item: current,
                steps,
                cause: Some(fault),
            };
        }

        match self.state() {
            ContinuationState::Continue => {
                info!(steps, "Pipeline drained");
                RunOutcome::Drained { item: current, steps }
            }
            ContinuationState::Completed => {
                info!(steps, pending_tasks = self.tasks.len(), "Pipeline completed early");
                RunOutcome::Completed { item: current, steps }
            }
            ContinuationState::Terminated => {
                info!(steps, pending_tasks = self.tasks.len(), "Pipeline terminated");
                RunOutcome::Terminated {
                    item: current,
                    steps,
                    cause: None,
                }
            }
        }
    }

    fn finish_drained(&self, current: &PipelineItem) -> Result<(), JobflowError> {
        self.events
            .emit_checked(&PipelineEvent::Completed(Some(current.clone())))?;
        self.log("Pipeline completed successfully.");
        Ok(())
    }

    async fn run_loop(
        &self,
        current: &mut PipelineItem,
        steps: &mut usize,
    ) -> Result<(), JobflowError> {
        while self.state().should_continue() && !self.tasks.is_empty() {
            self.execute_middlewares(MiddlewarePhase::Pre, current).await?;

            if self.state().is_halted() {
                self.log("Pipeline execution terminated by pre-middleware.");
                break;
            }

            let Some(task) = self.tasks.pop() else {
                self.log("No more tasks to execute.");
                break;
            };

            let index = *steps;
            debug!(task = task.name(), index, "Running task");
            self.log(&format!("Executing task with data: {}", current.payload));

            *current = catch_fault(
                task.run(current.clone()),
                |e| JobflowError::task(index, e),
                || format!("task {index}"),
            )
            .await?;
            *steps += 1;

            self.events
                .emit_checked(&PipelineEvent::StepUpdate(current.clone()))?;
            self.log(&format!("Task completed with data: {}", current.payload));

            self.execute_middlewares(MiddlewarePhase::Post, current).await?;

            if self.state().is_halted() {
                self.log("Pipeline execution terminated by post-middleware.");
            }
        }
        Ok(())
    }
}

/// Awaits a step, turning both errors and panics into a [`JobflowError`].
async fn catch_fault<T, Fut>(
    fut: Fut,
    on_error: impl FnOnce(&anyhow::Error) -> JobflowError,
    context: impl FnOnce() -> String,
) -> Result<T, JobflowError>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(on_error(&e)),
        Err(payload) => Err(JobflowError::panicked(context(), payload.as_ref())),
    }
}

/// Clears the running flag when a run ends, including on cancellation.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, JobflowError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| JobflowError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A sequential pipeline of single-use tasks wrapped in middleware hooks.
///
/// Each run pops tasks from the front of the queue, running every
/// pre-middleware before a task and every post-middleware after it, until the
/// queue is empty or [`complete`](Self::complete) /
/// [`terminate`](Self::terminate) is called.
///
/// ```rust,ignore
/// let pipeline = JobPipeline::default();
/// pipeline.add_task_fn(|item| async move {
///     Ok(PipelineItem::new(format!("{} -> A", item.payload), "a"))
/// });
/// pipeline.on(EventKind::StepUpdate, |event| println!("{:?}", event.item()));
///
/// let outcome = pipeline.execute_pipeline("hello").await?;
/// assert_eq!(outcome.item().payload, "hello -> A");
/// ```
pub struct JobPipeline {
    shared: Arc<PipelineShared>,
}

impl Default for JobPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl JobPipeline {
    /// Creates a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            shared: Arc::new(PipelineShared {
                tasks: TaskQueue::new(),
                pre_middlewares: MiddlewareChain::new(),
                post_middlewares: MiddlewareChain::new(),
                state: RwLock::new(ContinuationState::Continue),
                running: AtomicBool::new(false),
                events: EventBus::new(),
                config,
            }),
        }
    }

    /// Returns a handle for controlling the pipeline from tasks, middlewares
    /// or other tasks on the runtime.
    #[must_use]
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle::new(Arc::downgrade(&self.shared))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.shared.config
    }

    /// Appends a task to the queue.
    pub fn add_task<T: Task + 'static>(&self, task: T) {
        self.shared.push_task(Box::new(task));
    }

    /// Appends a closure task to the queue.
    pub fn add_task_fn<F, Fut>(&self, func: F)
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PipelineItem>> + Send + 'static,
    {
        self.add_task(FnTask::new(func));
    }

    /// Appends a middleware run before every task.
    pub fn add_pre_middleware<M: Middleware + 'static>(&self, middleware: M) {
        self.shared.pre_middlewares.add(Arc::new(middleware));
    }

    /// Appends a closure middleware run before every task.
    pub fn add_pre_middleware_fn<F, Fut>(&self, func: F)
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_pre_middleware(FnMiddleware::new(func));
    }

    /// Appends a middleware run after every task.
    pub fn add_post_middleware<M: Middleware + 'static>(&self, middleware: M) {
        self.shared.post_middlewares.add(Arc::new(middleware));
    }

    /// Appends a closure middleware run after every task.
    pub fn add_post_middleware_fn<F, Fut>(&self, func: F)
    where
        F: Fn(PipelineItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_post_middleware(FnMiddleware::new(func));
    }

    /// Subscribes a listener to one event kind.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.shared.events.on(kind, listener)
    }

    /// Subscribes a listener by event name, e.g. `"stepUpdate"`.
    pub fn on_name<F>(&self, name: &str, listener: F) -> Result<SubscriptionId, JobflowError>
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        let kind = name.parse::<EventKind>()?;
        Ok(self.on(kind, listener))
    }

    /// Subscribes a sink to every event.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionId {
        self.shared.events.subscribe(sink)
    }

    /// Removes a subscription.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.shared.events.off(id)
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Runs one middleware batch against `item`.
    ///
    /// Middlewares run strictly in order. The first failure is returned and
    /// the rest of the batch is skipped.
    pub async fn execute_middlewares(
        &self,
        phase: MiddlewarePhase,
        item: &PipelineItem,
    ) -> Result<(), JobflowError> {
        self.shared.execute_middlewares(phase, item).await
    }

    /// Runs the pipeline from a seed payload.
    ///
    /// Step faults never surface as `Err`: they terminate the run and are
    /// reported through [`RunOutcome::Terminated`]. The only error is
    /// [`JobflowError::AlreadyRunning`] when another run is in flight.
    ///
    /// The continuation state is not reset between runs; call
    /// [`reset`](Self::reset) to run again after `complete()` or
    /// `terminate()`.
    pub async fn execute_pipeline(&self, seed: impl Into<String>) -> Result<RunOutcome, JobflowError> {
        let _guard = RunGuard::acquire(&self.shared.running)?;
        let run_id = Uuid::new_v4();
        let outcome = self
            .shared
            .run(seed.into())
            .instrument(info_span!("pipeline_run", %run_id))
            .await;
        Ok(outcome)
    }

    /// Stops the run after the current step and emits `completed` with no
    /// payload.
    pub fn complete(&self) {
        self.shared.complete();
    }

    /// Stops the run after the current step and emits `terminated`.
    pub fn terminate(&self) {
        self.shared.terminate();
    }

    /// Restores the continuation state so the next run may pop tasks.
    pub fn reset(&self) {
        *self.shared.state.write() = ContinuationState::Continue;
        debug!("Pipeline continuation state reset");
    }

    /// Returns the continuation state.
    #[must_use]
    pub fn state(&self) -> ContinuationState {
        self.shared.state()
    }

    /// Returns the number of tasks still queued.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.shared.tasks.len()
    }

    /// Returns the number of middlewares in a batch.
    #[must_use]
    pub fn middleware_count(&self, phase: MiddlewarePhase) -> usize {
        self.shared.chain(phase).len()
    }

    /// Returns true while a run is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for JobPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPipeline")
            .field("pending_tasks", &self.pending_tasks())
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}
