//! Strand: a serialized state container with pluggable schedulers.
//!
//! Strand is split in three layers, each usable on its own:
//!
//! - [`queue`]: an unbounded blocking FIFO shared between threads.
//! - [`sched`]: schedulers deciding where and when a task runs.
//! - [`store`]: the state container built on top of both.
//!
//! The most common types are re-exported at the crate root.
//!
//! ```rust
//! use strand::{Cause, Reduced, Store};
//!
//! let store = Store::new(0u32, |n: u32, cause: &Cause<u32>| {
//!     Reduced::Next(n + cause.action().copied().unwrap_or(0))
//! })?;
//! store.dispatch(1);
//! store.dispatch(41);
//! store.stop();
//! store.wait_for_store();
//! assert_eq!(store.state(), 42);
//! # Ok::<(), strand::StoreError>(())
//! ```

pub use strand_queue as queue;
pub use strand_sched as sched;
pub use strand_store as store;

pub use strand_queue::BlockingQueue;
pub use strand_sched::{
    BackgroundScheduler, ImmediateScheduler, MainScheduler, SchedError, Scheduler, SchedulerExt,
};
pub use strand_store::{
    Action, Cause, Dispatcher, Disposer, Reduced, Reducer, ReducerError, Store, StoreError,
    Subscriber,
};
