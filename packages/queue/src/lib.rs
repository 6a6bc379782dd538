//! Blocking Queue: the hand-off primitive under the schedulers
//!
//! An unbounded FIFO guarded by a mutex and a condition variable. Producers
//! never wait; consumers wait while the queue is empty. This is the queue a
//! single-worker scheduler drains, but it carries any item type.
//!
//! # Example
//!
//! ```rust
//! use strand_queue::BlockingQueue;
//!
//! let queue = BlockingQueue::new();
//! queue.push("first");
//! queue.push("second");
//!
//! assert_eq!(queue.peek(), Some("first"));
//! assert_eq!(queue.pop().unwrap(), "first");
//! assert_eq!(queue.len(), 1);
//! ```

mod error;
mod queue;

pub use error::QueueError;
pub use queue::BlockingQueue;
