//! Model Builder
//!
//! This module turns an initial data snapshot and a table of actions into a
//! [`Model`]: a store whose state carries the data fields plus three
//! bookkeeping maps derived from the actions.
//!
//! # Concepts
//!
//! ## Data State
//!
//! An open JSON object supplied by the caller. It only changes through an
//! action result or [`Model::reset`].
//!
//! ## Actions
//!
//! Named functions registered as synchronous or asynchronous. Invoking one
//! through the model toggles its flags and merges an object result into
//! the data state.
//!
//! ## Bookkeeping
//!
//! - `busyStates`: per action, true while an asynchronous invocation is in
//!   flight. Synchronous actions are listed and always false.
//! - `errorStates`: per action, whether the most recent invocation failed.
//! - `lastUpdatedStates`: per field, when an action result last supplied it.
//!
//! # Example
//!
//! ```rust
//! use modelkit_core::model::{ActionTable, ModelBuilder};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let model = ModelBuilder::from_value(json!({ "page": null }))
//!     .actions(ActionTable::new().asynchronous("getPage", |path| async move {
//!         Ok::<_, std::io::Error>(json!({ "page": { "path": path } }))
//!     }))
//!     .build();
//!
//! let pending = model.invoke("getPage", json!("/"));
//! assert!(model.is_busy("getPage"));
//!
//! pending.await.unwrap();
//! assert!(!model.is_busy("getPage"));
//! assert_eq!(model.field("page"), Some(json!({ "path": "/" })));
//! # }
//! ```

mod action;
mod builder;
mod handle;
mod state;

pub use action::{ActionKind, ActionTable};
pub use builder::ModelBuilder;
pub use handle::Model;
pub use state::{ModelState, BUSY_STATES, ERROR_STATES, LAST_UPDATED_STATES, RESERVED_NAMES, RESET};
