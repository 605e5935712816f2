//! Action Table
//!
//! Actions are caller-supplied functions that may return a partial patch
//! for the data fields. Each one is registered explicitly as synchronous or
//! asynchronous; the kind is fixed once the table is built into a model.
//!
//! Every action takes a single JSON argument (use an array or object to
//! pass several) and resolves to a JSON value. Only an object result is
//! treated as a patch.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, TryFutureExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;

/// Whether an action returns immediately or a pending computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Sync,
    Async,
}

pub(crate) type SyncFn = Arc<dyn Fn(Value) -> Result<Value, ActionError> + Send + Sync>;
pub(crate) type AsyncFn =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ActionError>> + Send + Sync>;

/// A registered action with its erased signature.
#[derive(Clone)]
pub(crate) enum Action {
    Sync(SyncFn),
    Async(AsyncFn),
}

impl Action {
    pub(crate) fn kind(&self) -> ActionKind {
        match self {
            Action::Sync(_) => ActionKind::Sync,
            Action::Async(_) => ActionKind::Async,
        }
    }
}

/// Ordered collection of named actions.
///
/// # Example
///
/// ```rust
/// use modelkit_core::model::{ActionKind, ActionTable};
/// use serde_json::{json, Value};
///
/// let actions = ActionTable::new()
///     .sync("setTitle", |title: Value| Ok::<_, &str>(json!({ "title": title })))
///     .asynchronous("getPage", |path: Value| async move {
///         Ok::<_, std::io::Error>(json!({ "page": { "path": path } }))
///     });
///
/// assert_eq!(actions.kind("getPage"), Some(ActionKind::Async));
/// ```
///
/// Registering a name twice replaces the earlier action in place.
#[derive(Clone, Default)]
pub struct ActionTable {
    actions: IndexMap<String, Action>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action that returns its result immediately.
    pub fn sync<F, E>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<ActionError>,
    {
        let action: SyncFn =
            Arc::new(move |args: Value| action(args).map_err(Into::<ActionError>::into));
        self.actions.insert(name.into(), Action::Sync(action));
        self
    }

    /// Register an action that returns a future.
    pub fn asynchronous<F, Fut, E>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        let action: AsyncFn = Arc::new(move |args: Value| {
            action(args).map_err(Into::<ActionError>::into).boxed()
        });
        self.actions.insert(name.into(), Action::Async(action));
        self
    }

    pub fn kind(&self, name: &str) -> Option<ActionKind> {
        self.actions.get(name).map(Action::kind)
    }

    /// Action names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Names of the actions of one kind, in registration order.
    pub fn names_of(&self, kind: ActionKind) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|(_, action)| action.kind() == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn into_inner(self) -> IndexMap<String, Action> {
        self.actions
    }
}

impl std::fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.actions.iter().map(|(name, action)| (name, action.kind())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ActionTable {
        ActionTable::new()
            .asynchronous("getPage", |_| async { Ok::<_, ActionError>(json!(null)) })
            .sync("setTitle", |_| Ok::<_, ActionError>(json!(null)))
            .asynchronous("save", |_| async { Ok::<_, ActionError>(json!(null)) })
    }

    #[test]
    fn classification_follows_registration() {
        let table = table();

        assert_eq!(table.kind("getPage"), Some(ActionKind::Async));
        assert_eq!(table.kind("setTitle"), Some(ActionKind::Sync));
        assert_eq!(table.kind("missing"), None);
        assert_eq!(table.names_of(ActionKind::Async), vec!["getPage", "save"]);
        assert_eq!(table.names_of(ActionKind::Sync), vec!["setTitle"]);
    }

    #[test]
    fn names_keep_registration_order() {
        let names: Vec<_> = table().names().map(str::to_string).collect();
        assert_eq!(names, vec!["getPage", "setTitle", "save"]);
    }

    #[test]
    fn reregistering_replaces_kind() {
        let table = table().sync("getPage", |_| Ok::<_, ActionError>(json!(null)));

        assert_eq!(table.len(), 3);
        assert_eq!(table.kind("getPage"), Some(ActionKind::Sync));
    }

    #[test]
    fn sync_errors_are_boxed() {
        let table = ActionTable::new().sync("fail", |_| Err::<Value, _>("boom"));

        let Some(Action::Sync(action)) = table.into_inner().shift_remove("fail") else {
            panic!("expected a sync action");
        };
        assert_eq!(action(json!(null)).unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn async_actions_receive_arguments() {
        let table = ActionTable::new()
            .asynchronous("echo", |args| async move { Ok::<_, ActionError>(args) });

        let Some(Action::Async(action)) = table.into_inner().shift_remove("echo") else {
            panic!("expected an async action");
        };
        assert_eq!(action(json!([1, 2])).await.unwrap(), json!([1, 2]));
    }

    #[tokio::test]
    async fn async_errors_of_any_type_are_boxed() {
        let table = ActionTable::new().asynchronous("getPage", |_| async {
            Err::<Value, _>(std::io::Error::new(std::io::ErrorKind::Other, "network"))
        });

        let Some(Action::Async(action)) = table.into_inner().shift_remove("getPage") else {
            panic!("expected an async action");
        };
        let err = action(json!(null)).await.unwrap_err();
        assert_eq!(err.downcast::<std::io::Error>().unwrap().to_string(), "network");
    }
}
