//! The blocking queue itself.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::QueueError;

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// An unbounded FIFO queue shared between threads.
///
/// Any number of threads may push and pop concurrently. `push` never blocks;
/// `pop` parks the calling thread until an item arrives. Each pushed item is
/// handed to exactly one `pop` (or `try_pop`/`drain`) call.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use strand_queue::BlockingQueue;
///
/// let queue = Arc::new(BlockingQueue::new());
///
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.pop().unwrap())
/// };
///
/// queue.push(42);
/// assert_eq!(consumer.join().unwrap(), 42);
/// ```
pub struct BlockingQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item to the tail and wake one waiting consumer.
    pub fn push(&self, item: T) {
        let mut inner = self.lock();
        inner.items.push_back(item);
        self.available.notify_one();
    }

    /// Remove and return the head, waiting while the queue is empty.
    ///
    /// Returns [`QueueError::Closed`] only after [`close`](Self::close) has
    /// been called and the remaining items have all been taken.
    pub fn pop(&self) -> Result<T, QueueError> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Ok(item);
            }
            if inner.closed {
                return Err(QueueError::Closed);
            }
            // Woken consumers race each other, so the head is re-checked.
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove and return the head if there is one, without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Inspect the head without removing it.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.lock().items.front().map(f)
    }

    /// Number of queued items at the time of the call.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether the queue held no items at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Take every queued item at once, in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.lock().items.drain(..).collect()
    }

    /// Close the queue and wake every waiting consumer.
    ///
    /// Items still queued (or pushed later) are delivered first; a consumer
    /// only sees [`QueueError::Closed`] once the queue is empty.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T: Clone> BlockingQueue<T> {
    /// Return a copy of the head without removing it.
    pub fn peek(&self) -> Option<T> {
        self.peek_with(T::clone)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("BlockingQueue")
            .field("len", &inner.items.len())
            .field("closed", &inner.closed)
            .finish()
    }
}
