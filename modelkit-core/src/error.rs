//! Error types for model stores.

use thiserror::Error;

/// The failure value produced by a caller-supplied action.
///
/// Actions may fail with any error type; it is boxed once at registration
/// and handed back to the caller unchanged.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The action itself failed. `source` is the action's own error and
    /// its message is displayed as is.
    #[error("{source}")]
    Action {
        action: String,
        source: ActionError,
    },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("action `{0}` is asynchronous and cannot be invoked synchronously")]
    NotSynchronous(String),

    #[error("field `{field}` could not be decoded")]
    Decode {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ModelError {
    /// Name of the action this error belongs to, if any.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            ModelError::Action { action, .. }
            | ModelError::UnknownAction(action)
            | ModelError::NotSynchronous(action) => Some(action.as_str()),
            ModelError::Decode { .. } => None,
        }
    }

    /// Whether this error is an action's own failure.
    pub fn is_action_failure(&self) -> bool {
        matches!(self, ModelError::Action { .. })
    }

    /// Borrow the action's original failure.
    pub fn action_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ModelError::Action { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Take back the action's original failure, unchanged.
    pub fn into_action_error(self) -> Option<ActionError> {
        match self {
            ModelError::Action { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
