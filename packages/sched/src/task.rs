//! Tasks and scheduler identity.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;
use uuid::Uuid;

/// A unit of work handed to a scheduler. Runs exactly once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Unique identity of a scheduler instance.
///
/// Two handles refer to the same scheduler exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchedulerId(Uuid);

impl SchedulerId {
    /// Create a new random SchedulerId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SchedulerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SchedulerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run a task, containing any panic it raises.
///
/// A panicking task counts as finished so that pending counts and joins
/// waiting on it still resolve.
pub(crate) fn run_task(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        error!(panic = panic_message(&*payload), "scheduled task panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
