//! Single-worker FIFO scheduler.
//!
//! One dedicated thread pops tasks from a private [`BlockingQueue`] and runs
//! them one at a time in submission order. Anything routed exclusively
//! through one `MainScheduler` is therefore serialized for free.
//!
//! ```text
//!   schedule ──push──▶ [ t1 | t2 | t3 | stop | ... ] ──pop──▶ worker thread
//! ```
//!
//! `stop` does not interrupt the worker. It enqueues a sentinel; when the
//! worker reaches it, every task scheduled before the `stop` call has already
//! run. The keep-alive count drops to zero, the queue is closed and the
//! worker's next `pop` ends the loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use strand_queue::BlockingQueue;
use tracing::{debug, info, warn};

use crate::config::{thread_builder, MainSchedulerConfig};
use crate::error::{Result, SchedError};
use crate::scheduler::Scheduler;
use crate::task::{run_task, SchedulerId, Task};

/// Lifecycle of a [`MainScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created; `schedule` is refused until `start`.
    NotStarted,
    /// The worker is running and accepting tasks.
    Running,
    /// `stop` was called; the worker finishes everything ahead of the sentinel.
    StopRequested,
    /// The worker has exited. `schedule` is refused.
    Drained,
}

struct Control {
    lifecycle: Lifecycle,
    worker_exited: bool,
}

struct Shared {
    id: SchedulerId,
    queue: BlockingQueue<Task>,
    keep_alive: AtomicUsize,
    control: Mutex<Control>,
    exited: Condvar,
    pending: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a task. Callers hold the control lock so that nothing slips in
    /// after the worker has collected its leftovers.
    fn enqueue(&self, task: Task) {
        *self.pending() += 1;
        self.queue.push(task);
    }

    fn tasks_done(&self, n: usize) {
        let mut pending = self.pending();
        *pending = pending.saturating_sub(n);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }

    fn run(self: Arc<Self>) {
        info!(scheduler = %self.id, "main scheduler running");

        // The queue only reports `Closed` once `release` has closed and
        // emptied it.
        while let Ok(task) = self.queue.pop() {
            run_task(task);
            self.tasks_done(1);
        }

        let mut control = self.control();
        control.worker_exited = true;
        self.exited.notify_all();
        debug!(scheduler = %self.id, "main scheduler drained");
    }

    /// Body of the stop sentinel. The last release closes the queue and
    /// discards whatever was queued behind the sentinel.
    fn release(&self) {
        if self.keep_alive.fetch_sub(1, Ordering::AcqRel) > 1 {
            return;
        }

        let leftovers = {
            let mut control = self.control();
            control.lifecycle = Lifecycle::Drained;
            self.queue.close();
            self.queue.drain()
        };

        // Only reachable when `schedule` raced with shutdown.
        if !leftovers.is_empty() {
            let remaining = leftovers.len();
            warn!(
                scheduler = %self.id,
                remaining,
                "main scheduler stopping with tasks queued behind the sentinel; discarding them"
            );
            drop(leftovers);
            self.tasks_done(remaining);
        }
    }
}

/// Runs tasks strictly one at a time, in FIFO order, on one worker thread.
///
/// The scheduler must be started before use: `schedule` on a scheduler that
/// was never started fails with [`SchedError::NotStarted`], and after the
/// worker has drained it fails with [`SchedError::Stopped`]. Dropping the
/// scheduler requests a stop, so the worker thread never outlives it by more
/// than the work already queued.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use strand_sched::{MainScheduler, Scheduler, SchedulerExt};
///
/// let scheduler = MainScheduler::new();
/// scheduler.start().unwrap();
///
/// let count = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let count = Arc::clone(&count);
///     scheduler.schedule_fn(move || { count.fetch_add(1, Ordering::SeqCst); }).unwrap();
/// }
///
/// scheduler.stop();
/// scheduler.wait_for_scheduler();
/// assert_eq!(count.load(Ordering::SeqCst), 10);
/// ```
pub struct MainScheduler {
    config: MainSchedulerConfig,
    shared: Arc<Shared>,
}

impl MainScheduler {
    /// Create a scheduler with the default configuration. Not yet started.
    pub fn new() -> Self {
        Self::with_config(MainSchedulerConfig::default())
    }

    /// Create a scheduler with the given configuration. Not yet started.
    pub fn with_config(config: MainSchedulerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                id: SchedulerId::new(),
                queue: BlockingQueue::new(),
                keep_alive: AtomicUsize::new(0),
                control: Mutex::new(Control {
                    lifecycle: Lifecycle::NotStarted,
                    worker_exited: false,
                }),
                exited: Condvar::new(),
                pending: Mutex::new(0),
                idle: Condvar::new(),
            }),
        }
    }

    /// Create and start a scheduler with the default configuration.
    pub fn started() -> Result<Self> {
        let scheduler = Self::new();
        scheduler.start()?;
        Ok(scheduler)
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.control().lifecycle
    }

    /// Number of tasks queued or running.
    pub fn pending(&self) -> usize {
        *self.shared.pending()
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }
}

impl Default for MainScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MainScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainScheduler")
            .field("id", &self.shared.id)
            .field("lifecycle", &self.lifecycle())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for MainScheduler {
    fn id(&self) -> SchedulerId {
        self.shared.id
    }

    fn start(&self) -> Result<()> {
        let mut control = self.shared.control();
        match control.lifecycle {
            Lifecycle::NotStarted => {}
            Lifecycle::Running | Lifecycle::StopRequested => return Ok(()),
            Lifecycle::Drained => return Err(SchedError::Stopped),
        }

        self.shared.keep_alive.store(1, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        thread_builder(&self.config.thread_name, self.config.stack_size)
            .spawn(move || shared.run())?;

        control.lifecycle = Lifecycle::Running;
        Ok(())
    }

    fn schedule(&self, task: Task) -> Result<()> {
        let control = self.shared.control();
        match control.lifecycle {
            Lifecycle::NotStarted => Err(SchedError::NotStarted),
            Lifecycle::Drained => Err(SchedError::Stopped),
            Lifecycle::Running | Lifecycle::StopRequested => {
                self.shared.enqueue(task);
                Ok(())
            }
        }
    }

    fn stop(&self) {
        let mut control = self.shared.control();
        match control.lifecycle {
            Lifecycle::NotStarted => {
                control.lifecycle = Lifecycle::Drained;
                control.worker_exited = true;
                self.shared.exited.notify_all();
            }
            Lifecycle::Running => {
                debug!(scheduler = %self.shared.id, "main scheduler stop requested");
                control.lifecycle = Lifecycle::StopRequested;
                let shared: Weak<Shared> = Arc::downgrade(&self.shared);
                self.shared.enqueue(Box::new(move || {
                    if let Some(shared) = shared.upgrade() {
                        shared.release();
                    }
                }));
            }
            Lifecycle::StopRequested | Lifecycle::Drained => {}
        }
    }

    fn wait_for_scheduler(&self) {
        let mut control = self.shared.control();
        while !control.worker_exited {
            if control.lifecycle == Lifecycle::NotStarted {
                return;
            }
            control = self
                .shared
                .exited
                .wait(control)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn wait_for_idle(&self) {
        let mut pending = self.shared.pending();
        while *pending > 0 {
            pending = self
                .shared
                .idle
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for MainScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerExt;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    fn started() -> MainScheduler {
        MainScheduler::started().unwrap()
    }

    #[test]
    fn schedule_before_start_fails() {
        let scheduler = MainScheduler::new();
        assert_eq!(scheduler.lifecycle(), Lifecycle::NotStarted);
        let result = scheduler.schedule(Box::new(|| {}));
        assert!(matches!(result, Err(SchedError::NotStarted)));
    }

    #[test]
    fn start_is_idempotent() {
        let scheduler = MainScheduler::new();
        scheduler.start().unwrap();
        scheduler.start().unwrap();
        assert_eq!(scheduler.lifecycle(), Lifecycle::Running);
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert_eq!(scheduler.lifecycle(), Lifecycle::Drained);
    }

    #[test]
    fn no_tasks() {
        let scheduler = started();
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn runs_tasks_in_fifo_order() {
        let scheduler = started();
        let log = Arc::new(Mutex::new(Vec::new()));
        for idx in 0..1_000 {
            let log = Arc::clone(&log);
            scheduler
                .schedule_fn(move || log.lock().unwrap().push(idx))
                .unwrap();
        }
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert_eq!(*log.lock().unwrap(), (0..1_000).collect::<Vec<_>>());
    }

    #[test]
    fn runs_tasks_one_at_a_time() {
        let scheduler = started();
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        for _ in 0..100 {
            let busy = Arc::clone(&busy);
            let overlapped = Arc::clone(&overlapped);
            scheduler
                .schedule_fn(move || {
                    if busy.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    thread::yield_now();
                    busy.store(false, Ordering::SeqCst);
                })
                .unwrap();
        }
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert!(!overlapped.load(Ordering::SeqCst));
    }

    #[test]
    fn stop_runs_previously_scheduled_tasks() {
        let scheduler = started();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let count = Arc::clone(&count);
            scheduler
                .schedule_fn(move || {
                    thread::sleep(Duration::from_millis(2));
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn schedule_after_drain_fails() {
        let scheduler = started();
        scheduler.stop();
        scheduler.wait_for_scheduler();
        let result = scheduler.schedule(Box::new(|| {}));
        assert!(matches!(result, Err(SchedError::Stopped)));
        assert!(matches!(scheduler.start(), Err(SchedError::Stopped)));
    }

    #[test]
    fn tasks_behind_the_sentinel_are_discarded() {
        let scheduler = started();
        let gate = Arc::new(AtomicBool::new(false));
        let ran_late = Arc::new(AtomicBool::new(false));

        // Hold the worker so that the stop sentinel and the late task queue up
        // behind it.
        let g = Arc::clone(&gate);
        scheduler
            .schedule_fn(move || {
                while !g.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(1));
                }
            })
            .unwrap();
        scheduler.stop();
        assert_eq!(scheduler.lifecycle(), Lifecycle::StopRequested);

        let r = Arc::clone(&ran_late);
        scheduler
            .schedule_fn(move || r.store(true, Ordering::SeqCst))
            .unwrap();

        gate.store(true, Ordering::SeqCst);
        scheduler.wait_for_scheduler();

        assert!(!ran_late.load(Ordering::SeqCst));
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.queued(), 0);
    }

    #[test]
    fn drained_worker_leaves_queue_closed() {
        let scheduler = started();
        scheduler.schedule_fn(|| {}).unwrap();
        assert!(!scheduler.shared.queue.is_closed());

        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert!(scheduler.shared.queue.is_closed());
        assert!(scheduler.shared.queue.pop().is_err());
        assert_eq!(scheduler.lifecycle(), Lifecycle::Drained);
    }

    #[test]
    fn stop_without_start_drains_immediately() {
        let scheduler = MainScheduler::new();
        scheduler.stop();
        assert_eq!(scheduler.lifecycle(), Lifecycle::Drained);
        scheduler.wait_for_scheduler();
    }

    #[test]
    fn wait_for_idle_keeps_worker_alive() {
        let scheduler = started();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let count = Arc::clone(&count);
            scheduler
                .schedule_fn(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        scheduler.wait_for_idle();
        assert_eq!(count.load(Ordering::SeqCst), 50);
        assert_eq!(scheduler.lifecycle(), Lifecycle::Running);

        // Still accepting work.
        let c = Arc::clone(&count);
        scheduler
            .schedule_fn(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        scheduler.wait_for_idle();
        assert_eq!(count.load(Ordering::SeqCst), 51);
    }

    #[test]
    fn worker_thread_carries_configured_name() {
        let scheduler = MainScheduler::with_config(MainSchedulerConfig {
            thread_name: "main-test".to_string(),
            stack_size: None,
        });
        scheduler.start().unwrap();
        let name = Arc::new(Mutex::new(None));
        let n = Arc::clone(&name);
        scheduler
            .schedule_fn(move || {
                *n.lock().unwrap() = thread::current().name().map(str::to_string);
            })
            .unwrap();
        scheduler.wait_for_idle();
        assert_eq!(name.lock().unwrap().as_deref(), Some("main-test"));
    }

    #[test]
    fn panicking_task_does_not_kill_worker() {
        let scheduler = started();
        let ran = Arc::new(AtomicBool::new(false));
        scheduler.schedule_fn(|| panic!("main boom")).unwrap();
        let r = Arc::clone(&ran);
        scheduler
            .schedule_fn(move || r.store(true, Ordering::SeqCst))
            .unwrap();
        scheduler.stop();
        scheduler.wait_for_scheduler();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn drop_stops_worker() {
        let ran = Arc::new(AtomicBool::new(false));
        {
            let scheduler = started();
            let r = Arc::clone(&ran);
            scheduler
                .schedule_fn(move || {
                    thread::sleep(Duration::from_millis(10));
                    r.store(true, Ordering::SeqCst);
                })
                .unwrap();
            scheduler.wait_for_idle();
        }
        assert!(ran.load(Ordering::SeqCst));
    }
}
