//! Single-use task queue.

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::Task;

/// FIFO queue of pending tasks.
///
/// Tasks can only be pushed to the back and popped from the front. A popped
/// task is owned by the caller, so no task runs more than once.
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Box<dyn Task>>>,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task.
    pub fn push(&self, task: Box<dyn Task>) {
        self.tasks.lock().push_back(task);
    }

    /// Removes and returns the head task.
    pub fn pop(&self) -> Option<Box<dyn Task>> {
        self.tasks.lock().pop_front()
    }

    /// Returns the number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns true if no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Drops every pending task, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut tasks = self.tasks.lock();
        let count = tasks.len();
        tasks.clear();
        count
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("len", &self.len()).finish()
    }
}
