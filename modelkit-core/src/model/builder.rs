//! Model construction.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::action::ActionTable;
use super::handle::Model;
use super::state::ModelState;
use crate::clock::{Clock, SystemClock};
use crate::store::Store;

/// Builds a [`Model`] from an initial data snapshot and an action table.
///
/// Data field and action names must stay clear of the reserved names in
/// [`RESERVED_NAMES`](super::RESERVED_NAMES). This is not checked.
pub struct ModelBuilder {
    initial: Map<String, Value>,
    actions: ActionTable,
    clock: Arc<dyn Clock>,
}

impl ModelBuilder {
    pub fn new(initial: Map<String, Value>) -> Self {
        Self {
            initial,
            actions: ActionTable::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Start from a JSON value.
    ///
    /// Only an object carries fields. Any other value (`null`, arrays,
    /// primitives) means the model has no data fields, so last-updated
    /// stamps start empty and only appear once a patch lands.
    pub fn from_value(initial: Value) -> Self {
        match initial {
            Value::Object(initial) => Self::new(initial),
            _ => Self::new(Map::new()),
        }
    }

    pub fn actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Time source for last-updated stamps and freshness checks.
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Model {
        let Self {
            initial,
            actions,
            clock,
        } = self;

        let state = ModelState::seed(initial.clone(), actions.names());
        debug!(
            fields = initial.len(),
            actions = actions.len(),
            "model built"
        );

        let store = Store::new(state);
        Model::from_parts(store, actions.into_inner(), initial, clock)
    }
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("initial", &self.initial)
            .field("actions", &self.actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::model::ActionKind;
    use serde_json::json;

    #[test]
    fn build_seeds_every_action_and_field() {
        let model = ModelBuilder::from_value(json!({"page": null, "user": {"id": 1}}))
            .actions(
                ActionTable::new()
                    .asynchronous("getPage", |_| async { Ok::<_, ActionError>(json!(null)) })
                    .sync("setUser", |_| Ok::<_, ActionError>(json!(null))),
            )
            .build();

        let state = model.state();
        assert_eq!(state.data["user"], json!({"id": 1}));
        assert_eq!(state.busy_states.keys().collect::<Vec<_>>(), ["getPage", "setUser"]);
        assert_eq!(state.error_states.keys().collect::<Vec<_>>(), ["getPage", "setUser"]);
        assert!(state.last_updated_states.values().all(Option::is_none));
        assert_eq!(model.action_kind("getPage"), Some(ActionKind::Async));
        assert_eq!(model.action_kind("setUser"), Some(ActionKind::Sync));
    }

    #[test]
    fn non_object_initial_value_means_no_fields() {
        for initial in [json!(null), json!([1, 2, 3]), json!("page"), json!(4)] {
            let model = ModelBuilder::from_value(initial)
                .actions(ActionTable::new().sync("set", |v| Ok::<_, ActionError>(v)))
                .build();

            assert!(model.state().data.is_empty());
            assert!(model.state().last_updated_states.is_empty());

            model.invoke_sync("set", json!({"page": 1})).unwrap();
            assert_eq!(model.field("page"), Some(json!(1)));
            assert!(model.last_updated("page").is_some());

            model.reset();
            assert!(model.state().data.is_empty());
        }
    }
}
