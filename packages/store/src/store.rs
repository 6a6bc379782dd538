//! The store: serialized reduction and scheduler-aware notification.
//!
//! Every dispatch becomes one task on the store's scheduler. That task takes
//! the dispatch lock, runs the reducer chain, publishes the new state and
//! then notifies every subscriber on the subscriber's own scheduler. It
//! releases the lock only once all of them have returned.
//!
//! ```text
//!   dispatch ──▶ store scheduler ──▶ [ reduce ─▶ publish ─▶ fan-out ─▶ join ]
//!                                                           │
//!                                      ┌────────────────────┼────────────────┐
//!                                      ▼                    ▼                ▼
//!                                   inline            scheduler A       scheduler B
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, RwLock};

use strand_sched::{MainScheduler, Scheduler, SchedulerExt};
use tracing::{debug, trace, warn};

use crate::action::{Action, Cause, Dispatcher};
use crate::error::Result;
use crate::reducer::{reduce_all, Reducer, SharedReducer};
use crate::subscriber::{Change, Disposer, Subscriber, SubscriberEntry};

type Entry<S, A> = Arc<SubscriberEntry<S, A>>;

struct Inner<S, A> {
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<S>,
    reducers: RwLock<Vec<SharedReducer<S, A>>>,
    subscribers: Mutex<Vec<Entry<S, A>>>,
    dispatch_lock: Mutex<()>,
    age: AtomicU64,
    next_subscriber: AtomicU64,
    drained: AtomicBool,
}

impl<S, A> Inner<S, A> {
    fn state(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Entry<S, A>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatching(&self) -> MutexGuard<'_, ()> {
        self.dispatch_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reducers(&self) -> Vec<SharedReducer<S, A>> {
        self.reducers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A state container with serialized reduction.
///
/// `Store` is a cheap handle: clones share the same state, reducers and
/// subscribers. All mutation happens in tasks on the store's scheduler,
/// one dispatch at a time, and a dispatch completes only after every
/// subscriber has seen its result.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
/// use strand_store::{Cause, Reduced, Store};
///
/// fn counter(state: i64, cause: &Cause<i64>) -> Reduced<i64> {
///     Reduced::Next(state + cause.action().copied().unwrap_or(0))
/// }
///
/// let store = Store::new(0, counter)?;
/// let seen = Arc::new(AtomicI64::new(-1));
/// let s = Arc::clone(&seen);
/// store.subscribe(move |new: &i64, _old: &i64, _cause: &Cause<i64>| {
///     s.store(*new, Ordering::SeqCst);
/// });
///
/// store.dispatch(2);
/// store.dispatch(3);
/// store.stop();
/// store.wait_for_store();
///
/// assert_eq!(store.state(), 5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
/// # Ok::<(), strand_store::StoreError>(())
/// ```
pub struct Store<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    /// Create a store driven by a fresh, already started [`MainScheduler`].
    ///
    /// The scheduler belongs to the store; it is stopped when the store is
    /// stopped, or when the last handle to the store is dropped.
    pub fn new(initial: S, reducer: impl Reducer<S, A> + 'static) -> Result<Self> {
        let scheduler = MainScheduler::started()?;
        Ok(Self::with_scheduler(Arc::new(scheduler), initial, reducer))
    }

    /// Create a store driven by `scheduler`.
    ///
    /// The caller is responsible for starting the scheduler before the first
    /// dispatch. The scheduler may be shared with other stores; stopping
    /// any one of them stops it for all.
    ///
    /// A scheduler that does not run tasks one at a time in order (such as
    /// [`BackgroundScheduler`](strand_sched::BackgroundScheduler)) still
    /// never runs two reductions at once, but dispatches may then be reduced
    /// in any order.
    pub fn with_scheduler(
        scheduler: Arc<dyn Scheduler>,
        initial: S,
        reducer: impl Reducer<S, A> + 'static,
    ) -> Self {
        let first: SharedReducer<S, A> = Arc::new(reducer);
        Self {
            inner: Arc::new(Inner {
                scheduler,
                state: Mutex::new(initial),
                reducers: RwLock::new(vec![first]),
                subscribers: Mutex::new(Vec::new()),
                dispatch_lock: Mutex::new(()),
                age: AtomicU64::new(0),
                next_subscriber: AtomicU64::new(0),
                drained: AtomicBool::new(false),
            }),
        }
    }

    /// Append a reducer to the chain.
    ///
    /// A reducer added while a dispatch is in flight may or may not apply to
    /// that dispatch; it applies to every later one.
    pub fn add_reducer(&self, reducer: impl Reducer<S, A> + 'static) -> &Self {
        self.inner
            .reducers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(reducer));
        self
    }

    /// Submit an action.
    ///
    /// Plain values convert into [`Action::Reduce`]. Returns as soon as the
    /// work is scheduled; on a store driven by an
    /// [`ImmediateScheduler`](strand_sched::ImmediateScheduler) that means
    /// after reduction and notification have both completed.
    pub fn dispatch(&self, action: impl Into<Action<S, A>>) {
        if self.inner.drained.load(Ordering::Acquire) {
            debug!("dispatch on a drained store ignored");
            return;
        }

        match action.into() {
            Action::Async(thunk) => {
                let store = self.clone();
                self.run_on_store(move || thunk(store));
            }
            Action::Unit => self.schedule_transition(Cause::Unit),
            Action::Reduce(action) => self.schedule_transition(Cause::Action(action)),
        }
    }

    /// Subscribe on the store's own scheduler.
    ///
    /// The subscriber first receives the state current at subscription time
    /// as `(state, state, Cause::Init)`, then every later transition. The
    /// replay is ordered against dispatches like any other store work, so it
    /// never arrives after a newer state.
    pub fn subscribe(&self, subscriber: impl Subscriber<S, A> + 'static) -> Disposer {
        let scheduler = Arc::clone(&self.inner.scheduler);
        self.subscribe_on(scheduler, subscriber)
    }

    /// Subscribe on `scheduler`: every notification for this subscriber,
    /// including the replay, runs there.
    pub fn subscribe_on(
        &self,
        scheduler: Arc<dyn Scheduler>,
        subscriber: impl Subscriber<S, A> + 'static,
    ) -> Disposer {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(SubscriberEntry::new(id, scheduler, Box::new(subscriber)));
        let disposed = entry.disposed_flag();

        let store = Arc::downgrade(&self.inner);
        let disposer = Disposer::new(
            Arc::clone(&disposed),
            Box::new(move || {
                if let Some(inner) = store.upgrade() {
                    inner.subscribers().retain(|entry| entry.id != id);
                }
            }),
        );

        if self.inner.drained.load(Ordering::Acquire) {
            debug!(subscriber = id, "subscribe on a drained store ignored");
            disposed.store(true, Ordering::Release);
            return disposer;
        }

        let store = self.clone();
        if !self.run_on_store(move || store.attach(entry)) {
            disposed.store(true, Ordering::Release);
        }
        disposer
    }

    /// Request shutdown by stopping the store's scheduler.
    ///
    /// Work already scheduled still runs, and so do dispatches it issues
    /// while the scheduler drains, as far as the scheduler accepts them: a
    /// [`MainScheduler`] discards tasks queued behind its stop request. Once
    /// [`wait_for_store`](Self::wait_for_store) has returned the store is
    /// inert.
    ///
    /// A scheduler shared with other stores or subscribers is stopped for
    /// all of them.
    pub fn stop(&self) {
        self.inner.scheduler.stop();
    }

    /// Block until the store's scheduler has drained and terminated. From
    /// then on `dispatch` and `subscribe` are ignored.
    ///
    /// Must not be called from a subscriber or an asynchronous action of
    /// this store: on a [`MainScheduler`] the calling task would wait for
    /// the worker it is running on.
    pub fn wait_for_store(&self) {
        self.inner.scheduler.wait_for_scheduler();
        self.inner.drained.store(true, Ordering::Release);
    }

    /// Block until the store's scheduler has nothing pending or running,
    /// without stopping it.
    ///
    /// Must not be called from a subscriber or an asynchronous action of
    /// this store: the calling task is itself pending.
    pub fn wait_for_idle(&self) {
        self.inner.scheduler.wait_for_idle();
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.state().clone()
    }

    /// Number of completed reductions.
    pub fn age(&self) -> u64 {
        self.inner.age.load(Ordering::Acquire)
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    /// Whether [`wait_for_store`](Self::wait_for_store) has returned.
    pub fn is_drained(&self) -> bool {
        self.inner.drained.load(Ordering::Acquire)
    }

    /// The scheduler driving this store.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.inner.scheduler
    }

    /// Schedule `task` on the store's scheduler. Returns `false` when the
    /// scheduler refused it.
    fn run_on_store(&self, task: impl FnOnce() + Send + 'static) -> bool {
        match self.inner.scheduler.schedule_fn(task) {
            Ok(()) => true,
            Err(error) => {
                debug!(%error, "store scheduler refused work; dropping it");
                false
            }
        }
    }

    fn schedule_transition(&self, cause: Cause<A>) {
        let store = self.clone();
        self.run_on_store(move || store.transition(cause));
    }

    /// One reduce-then-notify cycle. Runs on the store's scheduler.
    fn transition(&self, cause: Cause<A>) {
        let inner = &self.inner;
        let _dispatching = inner.dispatching();

        let old_state = inner.state().clone();
        let new_state = reduce_all(&inner.reducers(), old_state.clone(), &cause);
        *inner.state() = new_state.clone();
        let age = inner.age.fetch_add(1, Ordering::AcqRel) + 1;

        let entries = inner.subscribers().clone();
        let change = Arc::new(Change {
            new_state,
            old_state,
            cause,
        });
        debug!(age, subscribers = entries.len(), "notifying subscribers");
        self.fan_out(age, &entries, change);
    }

    /// Replay the current state to a new subscriber, then attach it.
    /// Runs on the store's scheduler.
    fn attach(&self, entry: Entry<S, A>) {
        let inner = &self.inner;
        let _dispatching = inner.dispatching();
        if entry.is_disposed() {
            return;
        }

        let state = inner.state().clone();
        let replay = Arc::new(Change {
            new_state: state.clone(),
            old_state: state,
            cause: Cause::Init,
        });
        let age = inner.age.load(Ordering::Acquire);
        trace!(age, subscriber = entry.id, "replaying state to new subscriber");
        self.fan_out(age, std::slice::from_ref(&entry), replay);

        let mut subscribers = inner.subscribers();
        if !entry.is_disposed() {
            subscribers.push(entry);
        }
    }

    /// Deliver `change` to every entry and wait until all have returned.
    ///
    /// Entries on the store's own scheduler run inline; a task queued behind
    /// this one on a serial scheduler would never start. Every other entry
    /// gets a task on its own scheduler, and each task holds a sender of the
    /// join channel, so the join ends even if a scheduler drops the task.
    fn fan_out(&self, age: u64, entries: &[Entry<S, A>], change: Arc<Change<S, A>>) {
        let own = self.inner.scheduler.id();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let mut remote = 0usize;

        for entry in entries {
            if entry.is_disposed() {
                continue;
            }
            if entry.scheduler.id() == own {
                entry.deliver(&change);
                continue;
            }

            let task_entry = Arc::clone(entry);
            let change = Arc::clone(&change);
            let done = done_tx.clone();
            let scheduled = entry.scheduler.schedule_fn(move || {
                if !task_entry.is_disposed() {
                    task_entry.deliver(&change);
                }
                let _ = done.send(());
            });
            match scheduled {
                Ok(()) => remote += 1,
                Err(error) => warn!(
                    age,
                    subscriber = entry.id,
                    %error,
                    "subscriber scheduler refused notification"
                ),
            }
        }

        drop(done_tx);
        let delivered = done_rx.iter().count();
        if delivered < remote {
            warn!(
                age,
                lost = remote - delivered,
                "notification tasks dropped before running"
            );
        }
    }
}

impl<S, A> Dispatcher<S, A> for Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    fn dispatch(&self, action: Action<S, A>) {
        Store::dispatch(self, action)
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("scheduler", &self.inner.scheduler.id())
            .field("age", &self.inner.age.load(Ordering::Acquire))
            .field("subscribers", &self.inner.subscribers().len())
            .field("drained", &self.inner.drained.load(Ordering::Acquire))
            .finish()
    }
}
