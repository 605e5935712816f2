//! Store Primitives
//!
//! The model layer sits on top of a small reactive store. This module
//! provides that store and the per-key selector helper consumers use to
//! watch individual fields.
//!
//! # Concepts
//!
//! ## Store
//!
//! A Store holds one state value. `set` patches it in place and notifies
//! every subscriber with a snapshot of the result. There is no dependency
//! tracking and no scheduler: a store update is a synchronous call into
//! each subscriber, in subscription order.
//!
//! ## Selector
//!
//! A Selector projects one part of a store's state (a data field, a busy
//! flag) and only notifies when that part changes.
//!
//! ## Subscription
//!
//! Every `subscribe` returns a handle. Dropping the handle unsubscribes.

mod cell;
mod selector;
mod subscriber;

pub use cell::Store;
pub use selector::Selector;
pub use subscriber::{SubscriberId, Subscription};
