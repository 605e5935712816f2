//! Model Handle
//!
//! A `Model` is the built store plus its wrapped actions. It is a cheap,
//! cloneable handle: pass it to whatever needs to read state or invoke
//! actions, and every clone sees the same store.
//!
//! # Invocation
//!
//! Asynchronous actions go through three store updates:
//!
//! 1. Start: `busy = true`, `error = false`. Applied before `invoke`
//!    returns, so the flag is visible before the future is first polled.
//!
//! 2. Settle: on success the result is merged (if it is an object) and
//!    `error = false`; on failure `error = true`.
//!
//! 3. End: `busy = false`, on every exit path. This runs after settle, so
//!    an observer never sees busy cleared before the error is recorded.
//!
//! Synchronous actions settle in a single update and never touch busy.
//!
//! Repeated invocations of the same action are not serialized: each one
//! writes its own flags, and the last to settle wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::action::{Action, ActionKind, AsyncFn, SyncFn};
use super::state::ModelState;
use crate::clock::Clock;
use crate::error::{ActionError, ModelError, Result};
use crate::store::{Selector, Store, Subscription};

struct ModelInner {
    store: Store<ModelState>,
    actions: IndexMap<String, Action>,
    initial: Map<String, Value>,
    clock: Arc<dyn Clock>,
}

/// A store with action-derived busy, error and last-updated bookkeeping.
///
/// Build one with [`ModelBuilder`](super::ModelBuilder) or [`Model::build`].
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Build a model with the system clock.
    pub fn build(initial: Map<String, Value>, actions: super::ActionTable) -> Self {
        super::ModelBuilder::new(initial).actions(actions).build()
    }

    pub(crate) fn from_parts(
        store: Store<ModelState>,
        actions: IndexMap<String, Action>,
        initial: Map<String, Value>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                store,
                actions,
                initial,
                clock,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Invoke an action by name.
    ///
    /// For an asynchronous action the start transition is applied before
    /// this returns; the rest happens as the future is driven. Dropping the
    /// future early still clears the busy flag.
    ///
    /// A synchronous action runs right here and the returned future is
    /// already complete.
    ///
    /// Resolves to the action's own result, or to
    /// [`ModelError::Action`] carrying the action's failure unchanged.
    pub fn invoke(&self, name: &str, args: Value) -> BoxFuture<'static, Result<Value>> {
        let Some(action) = self.inner.actions.get(name).cloned() else {
            return future::ready(Err(ModelError::UnknownAction(name.to_string()))).boxed();
        };

        match action {
            Action::Sync(action) => future::ready(self.run_sync(name, &action, args)).boxed(),
            Action::Async(action) => self.run_async(name, &action, args),
        }
    }

    /// Invoke a synchronous action and return its result directly.
    pub fn invoke_sync(&self, name: &str, args: Value) -> Result<Value> {
        match self.inner.actions.get(name) {
            Some(Action::Sync(action)) => self.run_sync(name, action, args),
            Some(Action::Async(_)) => Err(ModelError::NotSynchronous(name.to_string())),
            None => Err(ModelError::UnknownAction(name.to_string())),
        }
    }

    fn run_sync(&self, name: &str, action: &SyncFn, args: Value) -> Result<Value> {
        trace!(action = name, "sync action invoked");
        let outcome = action(args);
        self.settle(name, outcome)
    }

    fn run_async(
        &self,
        name: &str,
        action: &AsyncFn,
        args: Value,
    ) -> BoxFuture<'static, Result<Value>> {
        self.inner.store.set(|state| state.begin(name));
        debug!(action = name, "action started");

        let busy = BusyGuard {
            store: self.inner.store.clone(),
            action: name.to_string(),
        };
        let pending = action(args);
        let model = self.clone();

        async move {
            let outcome = pending.await;
            let result = model.settle(&busy.action, outcome);
            drop(busy);
            result
        }
        .boxed()
    }

    /// Record how an invocation ended, in one store update.
    fn settle(
        &self,
        name: &str,
        outcome: std::result::Result<Value, ActionError>,
    ) -> Result<Value> {
        match outcome {
            Ok(value) => {
                let now = self.inner.clock.now();
                let mut merged = Vec::new();
                self.inner
                    .store
                    .set(|state| merged = state.succeed(name, &value, now));
                debug!(action = name, merged = ?merged, "action settled");
                Ok(value)
            }
            Err(source) => {
                self.inner.store.set(|state| state.fail(name));
                debug!(action = name, error = %source, "action failed");
                Err(ModelError::Action {
                    action: name.to_string(),
                    source,
                })
            }
        }
    }

    pub fn action_kind(&self, name: &str) -> Option<ActionKind> {
        self.inner.actions.get(name).map(Action::kind)
    }

    /// Action names in registration order.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.inner.actions.keys().map(String::as_str)
    }

    /// Restore the initial data snapshot.
    ///
    /// Every last-updated entry goes back to "never". Busy and error flags
    /// are kept as they are.
    pub fn reset(&self) {
        self.inner.store.set(|state| state.restore(&self.inner.initial));
        debug!("model reset");
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Snapshot of the whole state.
    pub fn state(&self) -> ModelState {
        self.inner.store.get()
    }

    pub fn field(&self, key: &str) -> Option<Value> {
        self.inner.store.read(|state| state.field(key).cloned())
    }

    /// Decode a data field into a typed value.
    pub fn field_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.field(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|source| ModelError::Decode {
                field: key.to_string(),
                source,
            })
    }

    pub fn is_busy(&self, action: &str) -> bool {
        self.inner.store.read(|state| state.is_busy(action))
    }

    pub fn has_error(&self, action: &str) -> bool {
        self.inner.store.read(|state| state.has_error(action))
    }

    pub fn last_updated(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner.store.read(|state| state.last_updated(key))
    }

    /// Observe every store update.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn(&ModelState) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(notify)
    }

    /// A derived view of the state that only notifies on change.
    pub fn select<T, F>(&self, select: F) -> Selector<ModelState, T>
    where
        T: Clone + Send + Sync + PartialEq + 'static,
        F: Fn(&ModelState) -> T + Send + Sync + 'static,
    {
        Selector::new(&self.inner.store, select)
    }

    /// Selector for one data field.
    pub fn select_field(&self, key: &str) -> Selector<ModelState, Option<Value>> {
        let key = key.to_string();
        self.select(move |state| state.field(&key).cloned())
    }

    /// Selector for one action's busy flag.
    pub fn select_busy(&self, action: &str) -> Selector<ModelState, bool> {
        let action = action.to_string();
        self.select(move |state| state.is_busy(&action))
    }

    /// Selector for one action's error flag.
    pub fn select_error(&self, action: &str) -> Selector<ModelState, bool> {
        let action = action.to_string();
        self.select(move |state| state.has_error(&action))
    }

    /// Selector for one field's last-updated time.
    pub fn select_last_updated(&self, key: &str) -> Selector<ModelState, Option<DateTime<Utc>>> {
        let key = key.to_string();
        self.select(move |state| state.last_updated(&key))
    }

    /// The underlying store.
    pub fn store(&self) -> &Store<ModelState> {
        &self.inner.store
    }

    /// The clock used for timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// The data snapshot `reset` restores.
    pub fn initial_data(&self) -> &Map<String, Value> {
        &self.inner.initial
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("store", &self.inner.store.id())
            .field("actions", &self.inner.actions.keys().collect::<Vec<_>>())
            .field("state", &self.state())
            .finish()
    }
}

/// Clears an action's busy flag when dropped.
///
/// Held across the await so that cancellation clears the flag too.
struct BusyGuard {
    store: Store<ModelState>,
    action: String,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.store.set(|state| state.finish(&self.action));
        trace!(action = %self.action, "busy cleared");
    }
}
