//! Reducers and the reducer chain.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::action::Cause;

/// Failure reported by a reducer alongside the state it produced.
///
/// Never fatal: the store logs it and carries on with the next reducer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ReducerError {
    message: String,
}

impl ReducerError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture the message of any error.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::new(error.to_string())
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduced<S> {
    /// Hand the state to the next reducer.
    Next(S),
    /// Keep this state and skip every remaining reducer. Not a failure.
    Skip(S),
    /// The reducer failed. The state is kept and the chain continues.
    Failed(S, ReducerError),
}

impl<S> Reduced<S> {
    /// The state carried by this outcome.
    pub fn state(&self) -> &S {
        match self {
            Reduced::Next(state) | Reduced::Skip(state) | Reduced::Failed(state, _) => state,
        }
    }

    /// Consume the outcome and return its state.
    pub fn into_state(self) -> S {
        match self {
            Reduced::Next(state) | Reduced::Skip(state) | Reduced::Failed(state, _) => state,
        }
    }
}

/// A pure function from the current state and a cause to the next state.
///
/// Implemented for any `Fn(S, &Cause<A>) -> Reduced<S>`, so plain functions
/// and closures are reducers.
///
/// # Example
///
/// ```rust
/// use strand_store::{Cause, Reduced, Reducer};
///
/// fn counter(state: i64, cause: &Cause<i64>) -> Reduced<i64> {
///     match cause.action() {
///         Some(delta) => Reduced::Next(state + delta),
///         None => Reduced::Next(state),
///     }
/// }
///
/// assert_eq!(counter.reduce(1, &Cause::Action(2)), Reduced::Next(3));
/// assert_eq!(counter.reduce(1, &Cause::Unit), Reduced::Next(1));
/// ```
pub trait Reducer<S, A>: Send + Sync {
    /// Compute the next state.
    fn reduce(&self, state: S, cause: &Cause<A>) -> Reduced<S>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(S, &Cause<A>) -> Reduced<S> + Send + Sync,
{
    fn reduce(&self, state: S, cause: &Cause<A>) -> Reduced<S> {
        self(state, cause)
    }
}

pub(crate) type SharedReducer<S, A> = Arc<dyn Reducer<S, A>>;

/// Run `state` through `reducers` in order.
pub(crate) fn reduce_all<S, A>(reducers: &[SharedReducer<S, A>], state: S, cause: &Cause<A>) -> S {
    let mut state = state;
    for (index, reducer) in reducers.iter().enumerate() {
        match reducer.reduce(state, cause) {
            Reduced::Next(next) => state = next,
            Reduced::Skip(next) => {
                state = next;
                break;
            }
            Reduced::Failed(next, error) => {
                warn!(reducer = index, %error, "reducer failed; keeping its state");
                state = next;
            }
        }
    }
    state
}
