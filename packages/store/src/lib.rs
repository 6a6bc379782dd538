//! Strand store: a serialized state container
//!
//! A [`Store`] holds one current state, an ordered chain of [`Reducer`]s and
//! a list of [`Subscriber`]s, each bound to a [`Scheduler`]. Actions are
//! reduced one at a time on the store's own scheduler, and a dispatch is
//! only finished once every subscriber has observed its result, whichever
//! scheduler that subscriber runs on.
//!
//! # Guarantees
//!
//! - Reducers apply in registration order, never two at once for one store.
//! - On a store driven by a [`MainScheduler`] dispatches from one thread are
//!   reduced in the order they were dispatched.
//! - A new subscriber first receives the current state with
//!   [`Cause::Init`], then every later transition.
//! - A subscriber never observes an older state after a newer one.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strand_store::{Action, BackgroundScheduler, Cause, Reduced, Scheduler, Store};
//!
//! #[derive(Debug)]
//! enum Todo {
//!     Add(String),
//!     Clear,
//! }
//!
//! fn todos(mut state: Vec<String>, cause: &Cause<Todo>) -> Reduced<Vec<String>> {
//!     match cause.action() {
//!         Some(Todo::Add(item)) => state.push(item.clone()),
//!         Some(Todo::Clear) => state.clear(),
//!         None => {}
//!     }
//!     Reduced::Next(state)
//! }
//!
//! let store = Store::new(Vec::new(), todos)?;
//!
//! let background: Arc<dyn Scheduler> = Arc::new(BackgroundScheduler::new());
//! store.subscribe_on(background, |new: &Vec<String>, _old: &Vec<String>, _cause: &Cause<Todo>| {
//!     println!("{} items", new.len());
//! });
//!
//! store.dispatch(Todo::Add("write docs".to_string()));
//! store.dispatch(Action::thunk(|store: Store<Vec<String>, Todo>| {
//!     store.dispatch(Todo::Add("ship".to_string()));
//! }));
//!
//! // The thunk dispatches from the store's worker, so let it finish first.
//! store.wait_for_idle();
//! store.stop();
//! store.wait_for_store();
//! assert_eq!(store.state(), vec!["write docs".to_string(), "ship".to_string()]);
//! # Ok::<(), strand_store::StoreError>(())
//! ```

mod action;
mod error;
mod reducer;
mod store;
mod subscriber;

pub use action::{Action, AsyncAction, Cause, Dispatcher};
pub use error::{Result, StoreError};
pub use reducer::{Reduced, Reducer, ReducerError};
pub use store::Store;
pub use subscriber::{Disposer, Subscriber};

// Re-export the scheduler layer for convenience
pub use strand_sched::{
    BackgroundScheduler, ImmediateScheduler, MainScheduler, SchedError, Scheduler, SchedulerExt,
    SchedulerId,
};
