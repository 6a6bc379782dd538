//! Inline scheduler.

use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::task::{run_task, SchedulerId, Task};

/// Runs every task on the caller's own thread before `schedule` returns.
///
/// Introduces no concurrency. `start`, `stop` and the waits are no-ops.
#[derive(Debug, Default)]
pub struct ImmediateScheduler {
    id: SchedulerId,
}

impl ImmediateScheduler {
    /// Create a new inline scheduler.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ImmediateScheduler {
    fn id(&self) -> SchedulerId {
        self.id
    }

    fn start(&self) -> Result<()> {
        Ok(())
    }

    fn schedule(&self, task: Task) -> Result<()> {
        run_task(task);
        Ok(())
    }

    fn stop(&self) {}

    fn wait_for_scheduler(&self) {}

    fn wait_for_idle(&self) {}
}
