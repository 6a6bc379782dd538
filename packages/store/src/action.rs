//! Actions: what callers dispatch, and what reducers and subscribers see.

use crate::store::Store;

/// A side-effecting thunk.
///
/// It runs once on the store's scheduler and receives a handle to the store,
/// through which it may dispatch any number of further actions, from any
/// thread, now or later. It never touches state directly.
pub type AsyncAction<S, A> = Box<dyn FnOnce(Store<S, A>) + Send + 'static>;

/// Something handed to [`Store::dispatch`].
pub enum Action<S, A> {
    /// An application action, run through the reducer chain.
    Reduce(A),
    /// An action carrying no semantic change. Still runs a full
    /// reduce/notify cycle.
    Unit,
    /// A thunk; no reduce/notify cycle runs for the thunk itself.
    Async(AsyncAction<S, A>),
}

impl<S, A> Action<S, A> {
    /// Wrap a closure as an asynchronous action.
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(Store<S, A>) + Send + 'static,
    {
        Action::Async(Box::new(f))
    }

    /// Whether this is an asynchronous action.
    pub fn is_async(&self) -> bool {
        matches!(self, Action::Async(_))
    }
}

impl<S, A> From<A> for Action<S, A> {
    fn from(action: A) -> Self {
        Action::Reduce(action)
    }
}

impl<S, A: std::fmt::Debug> std::fmt::Debug for Action<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Reduce(action) => f.debug_tuple("Reduce").field(action).finish(),
            Action::Unit => f.write_str("Unit"),
            Action::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// The action behind a state transition, as reducers and subscribers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause<A> {
    /// Replay marker: delivered once to each new subscriber with the state
    /// current at subscription time as both new and old state.
    Init,
    /// A dispatched [`Action::Unit`].
    Unit,
    /// A dispatched [`Action::Reduce`].
    Action(A),
}

impl<A> Cause<A> {
    /// The application action, if there is one.
    pub fn action(&self) -> Option<&A> {
        match self {
            Cause::Action(action) => Some(action),
            Cause::Init | Cause::Unit => None,
        }
    }

    /// Whether this is the subscription replay marker.
    pub fn is_init(&self) -> bool {
        matches!(self, Cause::Init)
    }
}

/// Anything actions can be dispatched to.
///
/// [`Store`] is the implementation; the trait lets code that only dispatches
/// stay independent of the state type's other capabilities.
pub trait Dispatcher<S, A>: Send + Sync {
    /// Dispatch an action.
    fn dispatch(&self, action: Action<S, A>);
}
