//! Storage backends for snooze records.
//!
//! [`SnoozeStore`] is the seam between [`AlertFilter`](crate::AlertFilter)
//! and the place records live. Both implementations must behave the same
//! from the caller's point of view: a record is visible until its end time
//! and gone afterwards.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::types::{SnoozeKey, SnoozeRecord};

/// Records of one channel, addressed by their storage key.
pub type ChannelSnoozes = HashMap<String, SnoozeRecord>;

/// A key-value store with per-record expiry.
#[async_trait]
pub trait SnoozeStore: Send + Sync + fmt::Debug {
    /// Returns the backend name, for logging.
    fn name(&self) -> &'static str;

    /// Stores `record` under `key`, replacing whatever was there.
    ///
    /// `ttl` is the lifetime of the record and always matches its
    /// `snoozed_until` relative to the time it was built.
    async fn put(&self, key: &SnoozeKey, record: SnoozeRecord, ttl: Duration) -> Result<()>;

    /// Removes the record stored under `key`. Removing an absent key is not
    /// an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Returns `true` if a record for `key` exists and is still live at
    /// `now`. Expired records found on the way may be purged.
    async fn is_live(&self, key: &SnoozeKey, now: DateTime<Utc>) -> Result<bool>;

    /// Returns every record of `channel` that is still live at `now`.
    async fn list_channel(&self, channel: &str, now: DateTime<Utc>) -> Result<ChannelSnoozes>;

    /// Stops any background work owned by the store.
    async fn shutdown(&self) {}
}
