//! Freshness Query
//!
//! Decides whether a data field's value is stale, by comparing its
//! last-updated time against a window. This is a read-only view: it never
//! touches the store, and every call re-reads both the timestamp and the
//! clock.
//!
//! A field is stale when it has never been updated, or when strictly more
//! than the window has passed since its last update. Exactly the window is
//! still fresh.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Default staleness window: five minutes.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Options for a freshness query.
///
/// Deserializes from `{ "staleTimeMs": 1000 }`; a missing field means the
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FreshnessOptions {
    #[serde(rename = "staleTimeMs", with = "millis")]
    pub stale_time: Duration,
}

impl FreshnessOptions {
    pub fn new(stale_time: Duration) -> Self {
        Self { stale_time }
    }

    pub fn from_millis(stale_time_ms: u64) -> Self {
        Self::new(Duration::from_millis(stale_time_ms))
    }
}

impl Default for FreshnessOptions {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

/// Staleness view of one field.
#[derive(Debug, Clone)]
pub struct Freshness {
    model: Model,
    field: String,
    stale_time: Duration,
}

impl Freshness {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// When the field was last supplied by an action, if ever.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.model.last_updated(&self.field)
    }

    /// Time since the last update, measured now.
    pub fn age(&self) -> Option<chrono::Duration> {
        let now = self.model.clock().now();
        self.last_updated().map(|at| now.signed_duration_since(at))
    }

    pub fn is_stale(&self) -> bool {
        is_stale_at(self.last_updated(), self.model.clock().now(), self.stale_time)
    }
}

/// Build a freshness view for `field`.
pub fn freshness_of(model: &Model, field: &str, options: FreshnessOptions) -> Freshness {
    Freshness {
        model: model.clone(),
        field: field.to_string(),
        stale_time: options.stale_time,
    }
}

impl Model {
    /// Freshness of `field` with the default five minute window.
    pub fn freshness(&self, field: &str) -> Freshness {
        freshness_of(self, field, FreshnessOptions::default())
    }

    pub fn freshness_with(&self, field: &str, options: FreshnessOptions) -> Freshness {
        freshness_of(self, field, options)
    }
}

/// The staleness rule on its own.
///
/// A timestamp in the future counts as fresh. A window too large to
/// represent never expires.
pub fn is_stale_at(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    stale_time: Duration,
) -> bool {
    let Some(last_updated) = last_updated else {
        return true;
    };

    match chrono::Duration::from_std(stale_time) {
        Ok(window) => now.signed_duration_since(last_updated) > window,
        Err(_) => false,
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
