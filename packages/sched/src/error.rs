//! Error types for the scheduler layer.

use thiserror::Error;

/// Errors returned by scheduler operations.
///
/// Both `NotStarted` and `Stopped` mean the scheduler is not ready to accept
/// work; the task handed to `schedule` is dropped without running.
#[derive(Debug, Error)]
pub enum SchedError {
    /// `schedule` was called before `start`.
    #[error("scheduler not started")]
    NotStarted,

    /// The scheduler has drained and its worker has exited.
    #[error("scheduler stopped")]
    Stopped,

    /// The OS refused to create a worker thread.
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedError>;
