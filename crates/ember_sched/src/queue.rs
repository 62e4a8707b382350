//! # Task Queue
//!
//! Bounded-concurrency scheduler over a growable ring buffer.
//!
//! ## Design
//!
//! - `enqueue` returns once the task is durably in the buffer; a worker
//!   drains it, running at most `max_concurrent_tasks` bodies at once
//! - the buffer sits behind a `tokio::sync::Mutex`, whose FIFO (ticket)
//!   acquisition order means overlapping enqueues cannot corrupt the
//!   head/tail indices even though an enqueue may suspend mid-call
//! - a task body that fails is caught, logged and reported through its
//!   handle; the queue keeps draining
//! - pending tasks can be canceled; running tasks always run to completion

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::ring::RingBuffer;
use crate::task::{Task, TaskHandle, TaskId, TaskResult, TaskWork};

/// Tuning knobs for the queue.
#[derive(Clone, Copy, Debug)]
pub struct QueueConfig {
    /// Maximum task bodies running at once.
    pub max_concurrent_tasks: usize,
    /// Initial ring-buffer capacity; doubles on demand.
    pub initial_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 4,
            initial_capacity: 16,
        }
    }
}

struct QueuedTask {
    id: TaskId,
    name: String,
    work: TaskWork,
    tx: oneshot::Sender<TaskResult>,
}

impl QueuedTask {
    fn cancel_now(self) {
        // The enqueuer may have dropped its handle; that is fine.
        let _ = self.tx.send(TaskResult::canceled(self.id, self.name));
    }
}

struct Inner {
    buffer: tokio::sync::Mutex<RingBuffer<QueuedTask>>,
    canceled: Mutex<HashSet<TaskId>>,
    permits: Arc<Semaphore>,
    wake: Notify,
    next_id: AtomicU64,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    shutdown: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Pops the oldest live task, discarding canceled ones on the way.
    async fn pop_ready(&self) -> Option<DequeuedTask> {
        let mut buffer = self.buffer.lock().await;
        while let Some(task) = buffer.pop_front() {
            if self.canceled.lock().remove(&task.id) {
                debug!(task = %task.name, id = task.id, "dropping canceled task");
                task.cancel_now();
                continue;
            }
            return Some(DequeuedTask { task });
        }
        // Nothing is pending, so any remaining marks belong to tasks that
        // already ran; drop them.
        self.canceled.lock().clear();
        None
    }
}

/// A task removed from the queue, ready to execute.
///
/// Produced by [`TaskQueue::dequeue`]; the internal drain worker uses the
/// same path, so manual draining and scheduled draining behave identically.
pub struct DequeuedTask {
    task: QueuedTask,
}

impl DequeuedTask {
    /// The task's id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.task.id
    }

    /// The task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Runs the body to completion and delivers the result to the handle.
    ///
    /// A failing body is logged and reported as `Failed`; it never
    /// propagates.
    pub async fn run(self) {
        let QueuedTask { id, name, work, tx } = self.task;
        debug!(task = %name, id, "task running");
        let result = match work().await {
            Ok(()) => TaskResult::completed(id, name),
            Err(e) => {
                error!(task = %name, id, error = %e, "task failed");
                TaskResult::failed(id, name, e)
            }
        };
        let _ = tx.send(result);
    }

    async fn run_counted(self, inner: &Inner) {
        let now = inner.running.fetch_add(1, Ordering::SeqCst) + 1;
        inner.peak_running.fetch_max(now, Ordering::SeqCst);
        self.run().await;
        inner.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The bounded-concurrency task queue.
///
/// Cheap to clone; clones share the same buffer and worker.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    /// Creates the queue and spawns its drain worker.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn start(config: QueueConfig) -> Self {
        let max = config.max_concurrent_tasks.max(1);
        let inner = Arc::new(Inner {
            buffer: tokio::sync::Mutex::new(RingBuffer::with_capacity(config.initial_capacity)),
            canceled: Mutex::new(HashSet::new()),
            permits: Arc::new(Semaphore::new(max)),
            wake: Notify::new(),
            next_id: AtomicU64::new(0),
            running: AtomicUsize::new(0),
            peak_running: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            worker: Mutex::new(None),
        });
        let handle = tokio::spawn(drain(Arc::clone(&inner)));
        *inner.worker.lock() = Some(handle);
        Self { inner }
    }

    /// Appends a task; returns once it is durably queued.
    ///
    /// The returned handle resolves to the task's [`TaskResult`]. After
    /// [`TaskQueue::cleanup`] the task is refused and the handle resolves
    /// as canceled.
    pub async fn enqueue(&self, task: Task) -> TaskHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let name = task.name().to_string();
        let (tx, rx) = oneshot::channel();
        let handle = TaskHandle {
            id,
            name: name.clone(),
            rx,
        };

        if self.inner.shutdown.load(Ordering::SeqCst) {
            let _ = tx.send(TaskResult::canceled(id, name));
            return handle;
        }

        {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.push_back(QueuedTask {
                id,
                name,
                work: task.work,
                tx,
            });
        }
        self.inner.wake.notify_one();
        handle
    }

    /// Removes and returns the oldest pending task, or `None` if empty.
    pub async fn dequeue(&self) -> Option<DequeuedTask> {
        self.inner.pop_ready().await
    }

    /// Marks a pending task as canceled.
    ///
    /// Running tasks are unaffected: there is no preemptive cancellation.
    /// Ids that were never issued are ignored; a mark left by a task that
    /// already ran is pruned the next time the buffer drains.
    pub fn cancel(&self, id: TaskId) {
        if id == 0 || id > self.inner.next_id.load(Ordering::SeqCst) {
            return;
        }
        self.inner.canceled.lock().insert(id);
    }

    /// Number of tasks waiting in the buffer.
    pub async fn pending(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }

    /// Number of task bodies currently executing.
    #[must_use]
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// High-water mark of concurrently executing bodies.
    #[must_use]
    pub fn peak_running(&self) -> usize {
        self.inner.peak_running.load(Ordering::SeqCst)
    }

    /// Shuts the queue down: stops the worker, cancels everything pending,
    /// refuses new work. Outstanding handles resolve as canceled; bodies
    /// already running finish on their own.
    pub async fn cleanup(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        self.inner.permits.close();
        self.inner.wake.notify_one();
        if let Some(handle) = self.inner.worker.lock().take() {
            handle.abort();
        }
        let mut buffer = self.inner.buffer.lock().await;
        while let Some(task) = buffer.pop_front() {
            task.cancel_now();
        }
        self.inner.canceled.lock().clear();
    }
}

/// Worker loop: waits for work, then drains under the concurrency cap.
async fn drain(inner: Arc<Inner>) {
    loop {
        inner.wake.notified().await;
        loop {
            // Closed semaphore means cleanup; stop draining.
            let Ok(permit) = Arc::clone(&inner.permits).acquire_owned().await else {
                return;
            };
            let Some(task) = inner.pop_ready().await else {
                drop(permit);
                break;
            };
            let inner_ref = Arc::clone(&inner);
            tokio::spawn(async move {
                task.run_counted(&inner_ref).await;
                drop(permit);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use std::time::Duration;

    fn recording_task(log: &Arc<Mutex<Vec<u32>>>, marker: u32) -> Task {
        let log = Arc::clone(log);
        Task::new(format!("t{marker}"), move || async move {
            log.lock().push(marker);
            Ok(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_completion_order() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });
        let log = Arc::new(Mutex::new(Vec::new()));

        let h1 = queue.enqueue(recording_task(&log, 1)).await;
        let h2 = queue.enqueue(recording_task(&log, 2)).await;
        let h3 = queue.enqueue(recording_task(&log, 3)).await;

        assert!(h1.outcome().await.is_success());
        assert!(h2.outcome().await.is_success());
        assert!(h3.outcome().await.is_success());
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_concurrency() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 2,
            initial_capacity: 4,
        });

        let mut handles = Vec::new();
        for i in 0..8 {
            let task = Task::new(format!("sleeper{i}"), || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            });
            handles.push(queue.enqueue(task).await);
        }
        for handle in handles {
            assert!(handle.outcome().await.is_success());
        }
        assert!(queue.peak_running() <= 2, "peak {}", queue.peak_running());
        assert_eq!(queue.running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_task_is_not_fatal() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });

        let bad = Task::new("bad", || async { Err::<(), _>("boom".into()) });
        let good = Task::new("good", || async { Ok(()) });

        let h1 = queue.enqueue(bad).await;
        let h2 = queue.enqueue(good).await;

        let r1 = h1.outcome().await;
        assert_eq!(r1.status, TaskStatus::Failed);
        assert!(r1.error.unwrap().to_string().contains("boom"));

        let r2 = h2.outcome().await;
        assert_eq!(r2.status, TaskStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_task() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });
        let gate = Arc::new(Notify::new());

        let blocker_gate = Arc::clone(&gate);
        let blocker = Task::new("blocker", move || async move {
            blocker_gate.notified().await;
            Ok(())
        });
        let victim = Task::new("victim", || async { Ok(()) });

        let h1 = queue.enqueue(blocker).await;
        let h2 = queue.enqueue(victim).await;
        // Let the worker pick up the blocker before canceling.
        tokio::task::yield_now().await;
        queue.cancel(h2.id());
        gate.notify_one();

        assert!(h1.outcome().await.is_success());
        assert_eq!(h2.outcome().await.status, TaskStatus::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cancel_marks_are_pruned() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });

        // Ids never issued are ignored outright.
        queue.cancel(999);
        assert!(queue.inner.canceled.lock().is_empty());

        let handle = queue.enqueue(Task::new("done", || async { Ok(()) })).await;
        let id = handle.id();
        assert!(handle.outcome().await.is_success());

        // Canceling a task that already ran leaves a mark with nothing to
        // match; the next empty drain clears it.
        queue.cancel(id);
        assert!(!queue.inner.canceled.lock().is_empty());
        assert!(queue.dequeue().await.is_none());
        assert!(queue.inner.canceled.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_cancels_pending_and_refuses_new() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });
        let gate = Arc::new(Notify::new());

        let blocker_gate = Arc::clone(&gate);
        let blocker = Task::new("blocker", move || async move {
            blocker_gate.notified().await;
            Ok(())
        });
        let _h1 = queue.enqueue(blocker).await;
        let h2 = queue.enqueue(Task::new("pending", || async { Ok(()) })).await;
        tokio::task::yield_now().await;

        queue.cleanup().await;
        assert_eq!(h2.outcome().await.status, TaskStatus::Canceled);

        let h3 = queue.enqueue(Task::new("late", || async { Ok(()) })).await;
        assert_eq!(h3.outcome().await.status, TaskStatus::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_keeps_order() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });
        let gate = Arc::new(Notify::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let blocker_gate = Arc::clone(&gate);
        let h0 = queue
            .enqueue(Task::new("blocker", move || async move {
                blocker_gate.notified().await;
                Ok(())
            }))
            .await;
        tokio::task::yield_now().await;

        // Force several ring growths while the worker is blocked.
        let mut handles = Vec::new();
        for i in 0..20 {
            handles.push(queue.enqueue(recording_task(&log, i)).await);
        }
        assert_eq!(queue.pending().await, 20);

        gate.notify_one();
        assert!(h0.outcome().await.is_success());
        for handle in handles {
            assert!(handle.outcome().await.is_success());
        }
        assert_eq!(*log.lock(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_dequeue_shares_run_path() {
        let queue = TaskQueue::start(QueueConfig {
            max_concurrent_tasks: 1,
            initial_capacity: 2,
        });
        let gate = Arc::new(Notify::new());

        // Pin the worker on the only permit so the manual path owns task 2.
        let blocker_gate = Arc::clone(&gate);
        let h1 = queue
            .enqueue(Task::new("blocker", move || async move {
                blocker_gate.notified().await;
                Ok(())
            }))
            .await;
        tokio::task::yield_now().await;

        let h2 = queue.enqueue(Task::new("manual", || async { Ok(()) })).await;
        let dequeued = queue.dequeue().await.expect("task 2 is pending");
        assert_eq!(dequeued.id(), h2.id());
        assert_eq!(dequeued.name(), "manual");
        dequeued.run().await;
        assert!(h2.outcome().await.is_success());

        assert!(queue.dequeue().await.is_none());
        gate.notify_one();
        assert!(h1.outcome().await.is_success());
    }
}
