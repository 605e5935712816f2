//! Modelkit Core
//!
//! This crate adds action bookkeeping on top of a reactive store. Given
//! the initial data fields and a table of actions, it builds a model that
//! tracks, without any caller code:
//!
//! - a busy flag per action, true while an asynchronous call is in flight
//! - an error flag per action, set when the most recent call failed
//! - a last-updated timestamp per data field
//!
//! and answers "is this field stale?" for a given time window.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: The reactive store primitive and per-key selectors
//! - `model`: Action table, model builder and the wrapped-action handle
//! - `freshness`: Time-window staleness queries over last-updated stamps
//! - `clock`: Time sources (system and manual)
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use modelkit_core::model::{ActionTable, ModelBuilder};
//! use modelkit_core::freshness::FreshnessOptions;
//! use serde_json::json;
//!
//! let model = ModelBuilder::from_value(json!({ "title": "untitled" }))
//!     .actions(ActionTable::new().sync("rename", |title| {
//!         Ok::<_, &str>(json!({ "title": title }))
//!     }))
//!     .build();
//!
//! assert!(model.freshness("title").is_stale());
//!
//! model.invoke_sync("rename", json!("Home")).unwrap();
//! assert_eq!(model.field("title"), Some(json!("Home")));
//! assert!(!model.freshness_with("title", FreshnessOptions::from_millis(60_000)).is_stale());
//! ```

pub mod clock;
pub mod error;
pub mod freshness;
pub mod model;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ActionError, ModelError, Result};
pub use freshness::{freshness_of, Freshness, FreshnessOptions};
pub use model::{ActionKind, ActionTable, Model, ModelBuilder, ModelState};
