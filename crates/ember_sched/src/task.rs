//! # Tasks and Task Results
//!
//! A task is a named, no-argument, effectful unit of work. Completion and
//! failure are not signalled through registered callbacks; execution yields
//! an explicit [`TaskResult`] that the enqueuer consumes through its
//! [`TaskHandle`].

use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

/// Unique identifier for a queued task, assigned at enqueue time.
pub type TaskId = u64;

/// Error produced by a task body.
///
/// Boxed because tasks cross crate boundaries and carry domain errors.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The boxed future a task body evaluates to.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

pub(crate) type TaskWork = Box<dyn FnOnce() -> TaskFuture + Send + 'static>;

/// Lifecycle status of a task.
///
/// Monotonic: `Pending -> Running -> {Completed, Failed}` or
/// `Pending -> Canceled`. No other transition exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, not yet started.
    Pending,
    /// Body currently executing.
    Running,
    /// Body returned `Ok`.
    Completed,
    /// Body returned an error.
    Failed,
    /// Removed from the queue before it ever ran.
    Canceled,
}

/// A named unit of work awaiting execution.
pub struct Task {
    name: String,
    pub(crate) work: TaskWork,
}

impl Task {
    /// Creates a task from a name and an async body.
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            work: Box::new(move || Box::pin(body())),
        }
    }

    /// The task's name, used in logs and results.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

/// Final outcome of one task, delivered to the enqueuer.
#[derive(Debug)]
pub struct TaskResult {
    /// Task id.
    pub id: TaskId,
    /// Task name.
    pub name: String,
    /// Terminal status (`Completed`, `Failed` or `Canceled`).
    pub status: TaskStatus,
    /// The error, when `status` is `Failed`.
    pub error: Option<TaskError>,
}

impl TaskResult {
    pub(crate) fn completed(id: TaskId, name: String) -> Self {
        Self {
            id,
            name,
            status: TaskStatus::Completed,
            error: None,
        }
    }

    pub(crate) fn failed(id: TaskId, name: String, error: TaskError) -> Self {
        Self {
            id,
            name,
            status: TaskStatus::Failed,
            error: Some(error),
        }
    }

    pub(crate) fn canceled(id: TaskId, name: String) -> Self {
        Self {
            id,
            name,
            status: TaskStatus::Canceled,
            error: None,
        }
    }

    /// Returns true if the task ran to successful completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Caller-side handle to a queued task.
///
/// Await [`TaskHandle::outcome`] to consume the result; dropping the handle
/// lets the task run and discards the result.
#[derive(Debug)]
pub struct TaskHandle {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) rx: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    /// The id assigned at enqueue time.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the task's terminal result.
    ///
    /// If the queue was cleaned up before the task ran, the result is
    /// `Canceled`.
    pub async fn outcome(self) -> TaskResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => TaskResult::canceled(self.id, self.name),
        }
    }
}
