//! Thread-per-task scheduler.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::{thread_builder, BackgroundSchedulerConfig};
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::task::{run_task, SchedulerId, Task};

/// Count of tasks spawned but not yet finished.
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    settled: Condvar,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        *self.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.settled.notify_all();
        }
    }

    fn wait_settled(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self
                .settled
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Runs every task on its own freshly spawned thread.
///
/// Any number of tasks may run at once and finish in any order. There is no
/// queue: draining means waiting for the pending count to reach zero, so
/// `wait_for_scheduler` and `wait_for_idle` are the same wait and `stop` has
/// nothing to do.
pub struct BackgroundScheduler {
    id: SchedulerId,
    config: BackgroundSchedulerConfig,
    pending: Arc<Pending>,
}

impl BackgroundScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BackgroundSchedulerConfig::default())
    }

    /// Create a scheduler with the given configuration.
    pub fn with_config(config: BackgroundSchedulerConfig) -> Self {
        Self {
            id: SchedulerId::new(),
            config,
            pending: Arc::new(Pending::default()),
        }
    }

    /// Number of tasks spawned and not yet finished.
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}

impl Default for BackgroundScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackgroundScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundScheduler")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for BackgroundScheduler {
    fn id(&self) -> SchedulerId {
        self.id
    }

    fn start(&self) -> Result<()> {
        Ok(())
    }

    fn schedule(&self, task: Task) -> Result<()> {
        self.pending.begin();

        let pending = Arc::clone(&self.pending);
        let spawned = thread_builder(&self.config.thread_name, self.config.stack_size).spawn(
            move || {
                run_task(task);
                pending.finish();
            },
        );

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(scheduler = %self.id, error = %e, "background task thread not spawned");
                self.pending.finish();
                Err(e.into())
            }
        }
    }

    fn stop(&self) {
        debug!(scheduler = %self.id, "background scheduler stop requested");
    }

    fn wait_for_scheduler(&self) {
        self.pending.wait_settled();
    }

    fn wait_for_idle(&self) {
        self.pending.wait_settled();
    }
}
