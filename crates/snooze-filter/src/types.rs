//! Core types for the snooze filter.
//!
//! This module defines the key a snooze is addressed by and the record
//! stored for it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::epoch_seconds;

/// Separator between the channel and the rule reference in a storage key.
pub const KEY_SEPARATOR: char = ';';

/// Identifies one snoozed rule within one channel.
///
/// The storage form is `"{channel};{rule_url}"`. Channels must not contain
/// `;`, otherwise two different keys can serialize to the same string.
/// Rule references may contain `;` since [`SnoozeKey::parse`] splits at the
/// first separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnoozeKey {
    channel: String,
    rule_url: String,
}

impl SnoozeKey {
    /// Creates a key from a channel and a rule reference.
    #[must_use]
    pub fn new(channel: impl Into<String>, rule_url: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            rule_url: rule_url.into(),
        }
    }

    /// Splits a storage key back into its parts.
    ///
    /// Returns `None` if the separator is missing.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.split_once(KEY_SEPARATOR)
            .map(|(channel, rule_url)| Self::new(channel, rule_url))
    }

    /// Returns the channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the rule reference.
    #[must_use]
    pub fn rule_url(&self) -> &str {
        &self.rule_url
    }

    /// Returns the string the store addresses this key by.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SnoozeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.channel, self.rule_url)
    }
}

/// Metadata kept for one snoozed rule.
///
/// `snoozed_until` is fractional seconds since the Unix epoch. A record is
/// never extended in place: a new snooze for the same key replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeRecord {
    /// Alert title at the time it was snoozed.
    pub title: String,
    /// Reference to the alerting rule.
    pub rule_url: String,
    /// Who snoozed it.
    pub snoozed_by: String,
    /// End of the snooze, in epoch seconds.
    pub snoozed_until: f64,
    /// Channel the snooze applies to.
    pub channel: String,
}

impl SnoozeRecord {
    /// Creates a record for `key` that lasts until `until`.
    #[must_use]
    pub fn new(
        key: &SnoozeKey,
        title: impl Into<String>,
        snoozed_by: impl Into<String>,
        until: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            rule_url: key.rule_url.clone(),
            snoozed_by: snoozed_by.into(),
            snoozed_until: epoch_seconds(until),
            channel: key.channel.clone(),
        }
    }

    /// Returns the key this record is stored under.
    #[must_use]
    pub fn key(&self) -> SnoozeKey {
        SnoozeKey::new(&self.channel, &self.rule_url)
    }

    /// Returns `true` while the snooze has not yet ended at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until > epoch_seconds(now)
    }

    /// Returns the end of the snooze as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros((self.snoozed_until * 1_000_000.0).round() as i64)
    }

    /// Returns how long the snooze still lasts, or zero once it has ended.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at()
            .map_or_else(Duration::zero, |end| (end - now).max(Duration::zero()))
    }
}
