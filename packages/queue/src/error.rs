//! Error types for the queue layer.

use thiserror::Error;

/// Errors returned by [`BlockingQueue`](crate::BlockingQueue).
///
/// Emptiness is never an error: a blocking pop waits instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed and every queued item has been handed out.
    #[error("queue closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_works() {
        assert_eq!(format!("{}", QueueError::Closed), "queue closed");
    }
}
