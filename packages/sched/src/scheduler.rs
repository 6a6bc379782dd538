//! The scheduler trait.

use std::sync::Arc;

use crate::error::Result;
use crate::task::{SchedulerId, Task};

/// A strategy for where and when a [`Task`] runs.
///
/// Every implementation honours the same lifecycle contract:
///
/// - `start` prepares the execution context and is idempotent.
/// - `schedule` runs or enqueues a task.
/// - `stop` requests a graceful shutdown; work scheduled before the call
///   still runs.
/// - `wait_for_scheduler` blocks until the scheduler has drained and
///   terminated.
/// - `wait_for_idle` blocks until nothing is pending or running, without
///   terminating anything.
///
/// # Object Safety
///
/// This trait is object-safe: stores hold their scheduler as
/// `Arc<dyn Scheduler>`.
pub trait Scheduler: Send + Sync {
    /// Identity of this scheduler instance.
    fn id(&self) -> SchedulerId;

    /// Prepare the execution context.
    fn start(&self) -> Result<()>;

    /// Run or enqueue a task.
    ///
    /// On `Err` the task has been dropped without running.
    fn schedule(&self, task: Task) -> Result<()>;

    /// Request a graceful shutdown.
    fn stop(&self);

    /// Block until the scheduler has drained and terminated.
    fn wait_for_scheduler(&self);

    /// Block until no task is pending or running.
    fn wait_for_idle(&self);
}

/// Convenience methods available on every scheduler.
pub trait SchedulerExt: Scheduler {
    /// Schedule a closure without boxing it first.
    fn schedule_fn<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Box::new(f))
    }

    /// Whether `other` is this very scheduler instance.
    fn is_same(&self, other: &dyn Scheduler) -> bool {
        self.id() == other.id()
    }
}

impl<T: Scheduler + ?Sized> SchedulerExt for T {}

// Blanket implementations for shared and boxed schedulers

impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
    fn id(&self) -> SchedulerId {
        (**self).id()
    }

    fn start(&self) -> Result<()> {
        (**self).start()
    }

    fn schedule(&self, task: Task) -> Result<()> {
        (**self).schedule(task)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn wait_for_scheduler(&self) {
        (**self).wait_for_scheduler()
    }

    fn wait_for_idle(&self) {
        (**self).wait_for_idle()
    }
}

impl<T: Scheduler + ?Sized> Scheduler for Box<T> {
    fn id(&self) -> SchedulerId {
        self.as_ref().id()
    }

    fn start(&self) -> Result<()> {
        self.as_ref().start()
    }

    fn schedule(&self, task: Task) -> Result<()> {
        self.as_ref().schedule(task)
    }

    fn stop(&self) {
        self.as_ref().stop()
    }

    fn wait_for_scheduler(&self) {
        self.as_ref().wait_for_scheduler()
    }

    fn wait_for_idle(&self) {
        self.as_ref().wait_for_idle()
    }
}
