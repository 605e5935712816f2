//! Model State
//!
//! The state held by a model's store: the caller's data fields plus the
//! three bookkeeping maps derived from the action table.
//!
//! Every transition an action wrapper makes is a method here, so the
//! wrapper itself only decides *when* to patch, never *how*.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the busy map in the flattened snapshot.
pub const BUSY_STATES: &str = "busyStates";
/// Key of the error map in the flattened snapshot.
pub const ERROR_STATES: &str = "errorStates";
/// Key of the last-updated map in the flattened snapshot.
pub const LAST_UPDATED_STATES: &str = "lastUpdatedStates";
/// Name reserved for the reset operation.
pub const RESET: &str = "reset";

/// Names callers must not use for data fields or actions.
pub const RESERVED_NAMES: [&str; 4] = [BUSY_STATES, ERROR_STATES, LAST_UPDATED_STATES, RESET];

/// Snapshot of a model: data fields and bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    /// Caller-defined business fields.
    pub data: Map<String, Value>,

    /// Per-action in-flight flag.
    pub busy_states: IndexMap<String, bool>,

    /// Per-action "most recent invocation failed" flag.
    pub error_states: IndexMap<String, bool>,

    /// Per-field time of the most recent patch, `None` if never patched.
    pub last_updated_states: IndexMap<String, Option<DateTime<Utc>>>,
}

impl ModelState {
    /// Seed the bookkeeping maps for the given data and action names.
    pub fn seed<'a, I>(data: Map<String, Value>, actions: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut busy_states = IndexMap::new();
        let mut error_states = IndexMap::new();
        for name in actions {
            busy_states.insert(name.to_string(), false);
            error_states.insert(name.to_string(), false);
        }

        let last_updated_states = data.keys().map(|key| (key.clone(), None)).collect();

        Self {
            data,
            busy_states,
            error_states,
            last_updated_states,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_busy(&self, action: &str) -> bool {
        self.busy_states.get(action).copied().unwrap_or(false)
    }

    pub fn has_error(&self, action: &str) -> bool {
        self.error_states.get(action).copied().unwrap_or(false)
    }

    pub fn last_updated(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_updated_states.get(key).copied().flatten()
    }

    /// Invocation start: busy on, previous error cleared.
    pub(crate) fn begin(&mut self, action: &str) {
        self.busy_states.insert(action.to_string(), true);
        self.error_states.insert(action.to_string(), false);
    }

    /// Successful settlement: merge the result and clear the error flag.
    ///
    /// Returns the keys that were merged.
    pub(crate) fn succeed(
        &mut self,
        action: &str,
        result: &Value,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let merged = self.merge_patch(result, now);
        self.error_states.insert(action.to_string(), false);
        merged
    }

    /// Failed settlement.
    pub(crate) fn fail(&mut self, action: &str) {
        self.error_states.insert(action.to_string(), true);
    }

    /// Invocation end, on every exit path.
    pub(crate) fn finish(&mut self, action: &str) {
        self.busy_states.insert(action.to_string(), false);
    }

    /// Merge an action result into the data fields.
    ///
    /// Only a JSON object counts as a patch. Arrays, null and primitives
    /// leave data and timestamps untouched.
    pub(crate) fn merge_patch(&mut self, result: &Value, now: DateTime<Utc>) -> Vec<String> {
        let Value::Object(patch) = result else {
            return Vec::new();
        };

        let mut merged = Vec::with_capacity(patch.len());
        for (key, value) in patch {
            self.data.insert(key.clone(), value.clone());
            self.last_updated_states.insert(key.clone(), Some(now));
            merged.push(key.clone());
        }
        merged
    }

    /// Restore the initial data and forget every timestamp.
    ///
    /// Busy and error flags are left alone: in-flight invocations still own
    /// them and will clear them when they settle.
    pub(crate) fn restore(&mut self, initial: &Map<String, Value>) {
        self.data = initial.clone();
        self.last_updated_states = initial.keys().map(|key| (key.clone(), None)).collect();
    }

    /// Flatten into one JSON object.
    ///
    /// Data fields come first; the bookkeeping maps are written over them,
    /// so a data field that reuses a reserved name is shadowed.
    pub fn to_value(&self) -> Value {
        let mut flat = self.data.clone();
        flat.insert(BUSY_STATES.to_string(), to_object(&self.busy_states));
        flat.insert(ERROR_STATES.to_string(), to_object(&self.error_states));
        flat.insert(
            LAST_UPDATED_STATES.to_string(),
            Value::Object(
                self.last_updated_states
                    .iter()
                    .map(|(key, at)| {
                        let at = at.map_or(Value::Null, |at| Value::String(at.to_rfc3339()));
                        (key.clone(), at)
                    })
                    .collect(),
            ),
        );
        Value::Object(flat)
    }
}

fn to_object(flags: &IndexMap<String, bool>) -> Value {
    Value::Object(
        flags
            .iter()
            .map(|(key, flag)| (key.clone(), Value::Bool(*flag)))
            .collect(),
    )
}
