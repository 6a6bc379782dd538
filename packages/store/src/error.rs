//! Error types for the store layer.

use strand_sched::SchedError;
use thiserror::Error;

/// Errors that can occur while constructing a store.
///
/// Once a store exists its operations never fail: reducer failures are
/// logged, and dispatches refused by a stopped scheduler are dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's own scheduler could not be started.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_converts() {
        let err: StoreError = SchedError::NotStarted.into();
        assert!(matches!(err, StoreError::Scheduler(SchedError::NotStarted)));
        assert_eq!(err.to_string(), "scheduler error: scheduler not started");
    }
}
