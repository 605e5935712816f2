//! Store Implementation
//!
//! A Store is a shared, subscribable cell holding one state value. It is the
//! only primitive the model layer needs from a reactive system:
//!
//! 1. A constructor that takes the initial state (or an initializer).
//!
//! 2. `get`, which returns a snapshot of the current state.
//!
//! 3. `set`, which applies a partial update in place and then notifies
//!    every subscriber with the new snapshot.
//!
//! # Thread Safety
//!
//! The state lives behind a `parking_lot::RwLock`. Notifications are
//! delivered after the write lock is released, so a callback may read the
//! store, write to it, or unsubscribe itself without deadlocking.
//!
//! # Batching
//!
//! There is none. Every `set` produces exactly one notification round,
//! and subscribers observe each update as a discrete snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::subscriber::{SubscriberId, Subscription};

/// Counter for generating unique store IDs.
static STORE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique store ID.
fn next_store_id() -> u64 {
    STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type Notifier<S> = Arc<dyn Fn(&S) + Send + Sync>;
type NotifierList<S> = RwLock<Vec<(SubscriberId, Notifier<S>)>>;

/// A reactive store holding a value of type S.
///
/// # Type Parameters
///
/// - `S`: The state type. Must be Clone + Send + Sync so snapshots can be
///   handed to subscribers on any thread.
///
/// # Example
///
/// ```rust
/// use modelkit_core::store::Store;
///
/// let counter = Store::new(0);
/// let _sub = counter.subscribe(|value| println!("now {value}"));
///
/// counter.set(|value| *value += 1);
/// assert_eq!(counter.get(), 1);
/// ```
pub struct Store<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this store.
    id: u64,

    /// The current state.
    value: Arc<RwLock<S>>,

    /// Notification callbacks, in subscription order.
    notifiers: Arc<NotifierList<S>>,
}

impl<S> Store<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create a new store with the given initial state.
    pub fn new(value: S) -> Self {
        Self {
            id: next_store_id(),
            value: Arc::new(RwLock::new(value)),
            notifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a new store from a state initializer.
    pub fn with<F>(init: F) -> Self
    where
        F: FnOnce() -> S,
    {
        Self::new(init())
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a snapshot of the current state.
    pub fn get(&self) -> S {
        self.value.read().clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        f(&*self.value.read())
    }

    /// Apply an in-place update and notify subscribers.
    ///
    /// The closure sees the current state and patches whichever parts it
    /// needs; everything it leaves alone is kept as is.
    pub fn set<F>(&self, f: F)
    where
        F: FnOnce(&mut S),
    {
        let snapshot = {
            let mut guard = self.value.write();
            f(&mut *guard);
            guard.clone()
        };

        self.notify_subscribers(&snapshot);
    }

    /// Replace the whole state and notify subscribers.
    pub fn replace(&self, value: S) {
        self.set(move |state| *state = value);
    }

    /// Register a callback for every future update.
    ///
    /// The callback is not invoked with the current state; call [`get`]
    /// first if that is needed.
    ///
    /// [`get`]: Store::get
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let subscriber_id = SubscriberId::new();
        self.notifiers.write().push((subscriber_id, Arc::new(notify)));

        let notifiers = Arc::downgrade(&self.notifiers);
        Subscription::new(subscriber_id, move || {
            if let Some(notifiers) = notifiers.upgrade() {
                notifiers.write().retain(|(id, _)| *id != subscriber_id);
            }
        })
    }

    /// Remove a subscriber by ID.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.notifiers
            .write()
            .retain(|(id, _)| *id != subscriber_id);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.notifiers.read().len()
    }

    /// Notify all subscribers with a snapshot of the new state.
    fn notify_subscribers(&self, snapshot: &S) {
        // Release the list lock before calling out
        let notifiers: Vec<Notifier<S>> = self
            .notifiers
            .read()
            .iter()
            .map(|(_, notify)| Arc::clone(notify))
            .collect();

        trace!(store = self.id, subscribers = notifiers.len(), "store updated");

        for notify in notifiers {
            notify(snapshot);
        }
    }
}

impl<S> Clone for Store<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            notifiers: Arc::clone(&self.notifiers),
        }
    }
}

impl<S> std::fmt::Debug for Store<S>
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
