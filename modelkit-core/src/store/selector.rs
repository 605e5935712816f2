//! Selector Implementation
//!
//! A Selector is a derived, per-key view of a store. Consumers use it to
//! watch one field or one bookkeeping entry instead of the whole state.
//!
//! # How Selectors Work
//!
//! 1. `get` runs the selection function against the current state and
//!    caches the result.
//!
//! 2. `subscribe` registers a store callback that re-runs the selection on
//!    every update, compares it with the last value it saw, and only calls
//!    through when the selected value actually changed.
//!
//! The PartialEq bound on the selected type is what makes change detection
//! possible: a store update that touches other keys is filtered out here.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::cell::Store;
use super::subscriber::Subscription;

/// A cached projection of a store's state.
///
/// # Type Parameters
///
/// - `S`: The store's state type.
/// - `T`: The selected value. Must be Clone + Send + Sync + PartialEq.
pub struct Selector<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + PartialEq + 'static,
{
    store: Store<S>,

    /// The selection function.
    select: Arc<dyn Fn(&S) -> T + Send + Sync>,

    /// The last value returned by `get` (None if never read).
    cached: Arc<RwLock<Option<T>>>,
}

impl<S, T> Selector<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + PartialEq + 'static,
{
    /// Create a selector over the given store.
    pub fn new<F>(store: &Store<S>, select: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Self {
            store: store.clone(),
            select: Arc::new(select),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Select the current value.
    pub fn get(&self) -> T {
        let value = self.store.read(|state| (self.select)(state));
        *self.cached.write() = Some(value.clone());
        value
    }

    /// The value seen by the most recent `get`, without re-reading the store.
    pub fn cached(&self) -> Option<T> {
        self.cached.read().clone()
    }

    /// Register a callback that fires only when the selected value changes.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let select = Arc::clone(&self.select);
        let cached = Arc::clone(&self.cached);
        let last = Mutex::new(self.store.read(|state| select(state)));

        self.store.subscribe(move |state| {
            let next = select(state);

            // Check if value actually changed
            let changed = {
                let mut last = last.lock();
                if *last == next {
                    false
                } else {
                    *last = next.clone();
                    true
                }
            };

            if changed {
                *cached.write() = Some(next.clone());
                on_change(&next);
            }
        })
    }
}

impl<S, T> Clone for Selector<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            select: Arc::clone(&self.select),
            cached: Arc::clone(&self.cached),
        }
    }
}

impl<S, T> std::fmt::Debug for Selector<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + PartialEq + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("store", &self.store.id())
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Debug, Clone, Default)]
    struct Counters {
        hits: i32,
        misses: i32,
    }

    #[test]
    fn selector_reads_current_value() {
        let store = Store::new(Counters { hits: 3, misses: 0 });
        let hits = Selector::new(&store, |c: &Counters| c.hits);

        assert_eq!(hits.cached(), None);
        assert_eq!(hits.get(), 3);
        assert_eq!(hits.cached(), Some(3));

        store.set(|c| c.hits = 4);
        assert_eq!(hits.get(), 4);
    }

    #[test]
    fn selector_fires_only_on_change() {
        let store = Store::new(Counters::default());
        let hits = Selector::new(&store, |c: &Counters| c.hits);
        let fired = Arc::new(AtomicI32::new(0));
        let fired_clone = fired.clone();

        let _sub = hits.subscribe(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Unrelated key
        store.set(|c| c.misses += 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        store.set(|c| c.hits += 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Same value again
        store.set(|c| c.hits = 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(hits.cached(), Some(1));
    }

    #[test]
    fn dropping_subscription_stops_selector_callbacks() {
        let store = Store::new(Counters::default());
        let hits = Selector::new(&store, |c: &Counters| c.hits);

        let sub = hits.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 1);

        drop(sub);
        assert_eq!(store.subscriber_count(), 0);
    }
}
