//! Strand schedulers: where and when a task runs
//!
//! A [`Scheduler`] takes boxed closures ([`Task`]) and runs them according to
//! its own concurrency policy:
//!
//! | Scheduler                | Policy                                         |
//! |--------------------------|------------------------------------------------|
//! | [`ImmediateScheduler`]   | inline, on the caller's thread                 |
//! | [`BackgroundScheduler`]  | one new thread per task, unordered             |
//! | [`MainScheduler`]        | one worker thread, strict FIFO, one at a time  |
//!
//! There are no global scheduler instances. Construct the ones you need and
//! share them explicitly, usually as `Arc<dyn Scheduler>`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strand_sched::{BackgroundScheduler, MainScheduler, Scheduler, SchedulerExt};
//!
//! let main: Arc<dyn Scheduler> = Arc::new(MainScheduler::started()?);
//! let background: Arc<dyn Scheduler> = Arc::new(BackgroundScheduler::new());
//!
//! main.schedule_fn(|| println!("in order"))?;
//! background.schedule_fn(|| println!("whenever"))?;
//!
//! main.stop();
//! main.wait_for_scheduler();
//! background.wait_for_scheduler();
//! # Ok::<(), strand_sched::SchedError>(())
//! ```

mod background;
mod config;
mod error;
mod immediate;
mod main_loop;
mod scheduler;
mod task;

pub use background::BackgroundScheduler;
pub use config::{BackgroundSchedulerConfig, MainSchedulerConfig};
pub use error::{Result, SchedError};
pub use immediate::ImmediateScheduler;
pub use main_loop::{Lifecycle, MainScheduler};
pub use scheduler::{Scheduler, SchedulerExt};
pub use task::{SchedulerId, Task};
