//! Cancellable deferred tasks.
//!
//! The initialization trigger only needs two primitives: run this later, and
//! never mind. [`ManualScheduler`] queues tasks until the host drains them;
//! [`TokioScheduler`] spawns them on a current-thread tokio runtime behind a
//! single yield, so they run once the current burst of synchronous work on the
//! runtime thread has finished. A multi-thread runtime would start the task on
//! an idle worker in the middle of a burst, so it is rejected.

use crate::error::SchedulerError;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled task, unique per scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Schedule/cancel primitive for zero-delay deferred work.
pub trait Scheduler: Send + Sync + 'static {
    /// Run `task` after the caller's current synchronous work completes.
    fn schedule(&self, task: Task) -> TaskId;

    /// Cancel a task that has not started yet. Unknown ids are ignored.
    fn cancel(&self, id: TaskId);
}

/// Queue drained explicitly by the host event loop.
#[derive(Default)]
pub struct ManualScheduler {
    next: AtomicU64,
    queue: Mutex<VecDeque<(TaskId, Task)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the tasks that were queued when this call began.
    ///
    /// Tasks scheduled while draining wait for the next call, the same way a
    /// zero-delay timer set inside a timer callback fires on a later turn.
    pub fn run_pending(&self) -> usize {
        let horizon = self.next.load(Ordering::Acquire);
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.front() {
                    Some((id, _)) if id.0 < horizon => queue.pop_front(),
                    _ => None,
                }
            };
            match next {
                Some((id, task)) => {
                    tracing::trace!(%id, "manual scheduler: run");
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Keep draining until the queue stays empty.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task) -> TaskId {
        let mut queue = self.queue.lock();
        let id = TaskId(self.next.fetch_add(1, Ordering::AcqRel));
        queue.push_back((id, task));
        id
    }

    fn cancel(&self, id: TaskId) {
        self.queue.lock().retain(|(queued, _)| *queued != id);
    }
}

/// Spawns tasks on a current-thread tokio runtime.
pub struct TokioScheduler {
    handle: Handle,
    next: AtomicU64,
    tasks: Arc<Mutex<HashMap<TaskId, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Bind to `handle`, which must belong to a current-thread runtime.
    pub fn new(handle: Handle) -> Result<Self, SchedulerError> {
        if handle.runtime_flavor() != RuntimeFlavor::CurrentThread {
            return Err(SchedulerError::MultiThreadRuntime);
        }
        Ok(Self {
            handle,
            next: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Bind to the runtime of the calling thread.
    pub fn current() -> Result<Self, SchedulerError> {
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Self::new(handle)
    }

    /// Number of spawned tasks that have not started yet.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task) -> TaskId {
        let id = TaskId(self.next.fetch_add(1, Ordering::AcqRel));
        let tasks = Arc::clone(&self.tasks);

        // Hold the map while spawning so the task cannot deregister before it
        // has been registered.
        let mut registered = self.tasks.lock();
        let join = self.handle.spawn(async move {
            tokio::task::yield_now().await;
            if tasks.lock().remove(&id).is_none() {
                return;
            }
            tracing::trace!(%id, "tokio scheduler: run");
            task();
        });
        registered.insert(id, join);
        id
    }

    fn cancel(&self, id: TaskId) {
        if let Some(join) = self.tasks.lock().remove(&id) {
            tracing::trace!(%id, "tokio scheduler: abort");
            join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Task) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = count.clone();
        let make = move || -> Task {
            let shared = shared.clone();
            Box::new(move || {
                shared.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[test]
    fn test_manual_runs_in_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            scheduler.schedule(Box::new(move || order.lock().push(n)));
        }

        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_manual_cancel() {
        let scheduler = ManualScheduler::new();
        let (count, make) = counter();
        let first = scheduler.schedule(make());
        scheduler.schedule(make());
        scheduler.cancel(first);
        scheduler.cancel(TaskId(999));

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_defers_tasks_scheduled_while_draining() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (count, make) = counter();
        let inner = scheduler.clone();
        let task = make();
        scheduler.schedule(Box::new(move || {
            inner.schedule(task);
        }));

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tokio_defers_until_yield() {
        let scheduler = TokioScheduler::current().unwrap();
        let (count, make) = counter();
        scheduler.schedule(make());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_tokio_cancel() {
        let scheduler = TokioScheduler::current().unwrap();
        let (count, make) = counter();
        let id = scheduler.schedule(make());
        scheduler.schedule(make());
        scheduler.cancel(id);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tokio_rejects_multi_thread_runtime() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(SchedulerError::MultiThreadRuntime)
        ));
        assert!(matches!(
            TokioScheduler::new(Handle::current()),
            Err(SchedulerError::MultiThreadRuntime)
        ));
    }

    #[test]
    fn test_tokio_accepts_current_thread_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert!(TokioScheduler::new(runtime.handle().clone()).is_ok());
    }

    #[test]
    fn test_tokio_requires_runtime() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(SchedulerError::NoRuntime)
        ));
    }
}
