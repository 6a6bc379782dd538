//! Subscribers, their entries in a store, and the handle that removes them.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strand_sched::Scheduler;
use tracing::error;

use crate::action::Cause;

/// Callback notified after every state transition of a store.
///
/// Implemented for any `Fn(&S, &S, &Cause<A>)` taking `(new, old, cause)`.
pub trait Subscriber<S, A>: Send + Sync {
    /// Observe a transition from `old_state` to `new_state`.
    fn notify(&self, new_state: &S, old_state: &S, cause: &Cause<A>);
}

impl<S, A, F> Subscriber<S, A> for F
where
    F: Fn(&S, &S, &Cause<A>) + Send + Sync,
{
    fn notify(&self, new_state: &S, old_state: &S, cause: &Cause<A>) {
        self(new_state, old_state, cause)
    }
}

/// One transition, shared by every notification task of a fan-out.
pub(crate) struct Change<S, A> {
    pub(crate) new_state: S,
    pub(crate) old_state: S,
    pub(crate) cause: Cause<A>,
}

/// A subscriber bound to the scheduler it must run on.
pub(crate) struct SubscriberEntry<S, A> {
    pub(crate) id: u64,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    subscriber: Box<dyn Subscriber<S, A>>,
    disposed: Arc<AtomicBool>,
}

impl<S, A> SubscriberEntry<S, A> {
    pub(crate) fn new(
        id: u64,
        scheduler: Arc<dyn Scheduler>,
        subscriber: Box<dyn Subscriber<S, A>>,
    ) -> Self {
        Self {
            id,
            scheduler,
            subscriber,
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn disposed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.disposed)
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Invoke the subscriber on the current thread. A panicking subscriber
    /// is logged and does not take the fan-out down with it.
    pub(crate) fn deliver(&self, change: &Change<S, A>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.subscriber
                .notify(&change.new_state, &change.old_state, &change.cause)
        }));
        if outcome.is_err() {
            error!(subscriber = self.id, "subscriber panicked");
        }
    }
}

/// Handle returned by `subscribe`; [`dispose`](Disposer::dispose) removes the
/// subscription.
///
/// Dropping a `Disposer` does *not* unsubscribe. Disposing is idempotent,
/// safe from any thread (including from inside the subscriber itself), and
/// a no-op once the store is gone. A notification already in flight when
/// `dispose` is called may still be delivered.
pub struct Disposer {
    disposed: Arc<AtomicBool>,
    remove: Box<dyn Fn() + Send + Sync>,
}

impl Disposer {
    pub(crate) fn new(disposed: Arc<AtomicBool>, remove: Box<dyn Fn() + Send + Sync>) -> Self {
        Self { disposed, remove }
    }

    /// Remove the subscription.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            (self.remove)();
        }
    }

    /// Whether `dispose` has been called, or the subscription never took
    /// effect because the store had already drained.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
