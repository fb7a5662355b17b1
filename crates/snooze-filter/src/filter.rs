//! Alert filter for snoozing and waking alert rules.
//!
//! This module provides the [`AlertFilter`], the entry point callers use to
//! decide whether an inbound alert is suppressed and to change snoozes from
//! interactive controls. It behaves the same whichever [`SnoozeStore`] it
//! wraps.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{FilterBackend, FilterConfig};
use crate::error::{Result, SnoozeError};
use crate::memory::InMemoryStore;
use crate::redis_store::RedisStore;
use crate::store::{ChannelSnoozes, SnoozeStore};
use crate::types::{KEY_SEPARATOR, SnoozeKey, SnoozeRecord};

/// Decides which alerts are currently snoozed.
///
/// Construct one per process and pass it down to the ingestion and
/// interaction paths. Call [`AlertFilter::shutdown`] before exiting.
#[derive(Debug, Clone)]
pub struct AlertFilter {
    store: Arc<dyn SnoozeStore>,
    clock: Arc<dyn Clock>,
}

impl AlertFilter {
    /// Creates a filter over `store` using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn SnoozeStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a filter over `store` reading time from `clock`.
    #[must_use]
    pub fn with_clock(store: Arc<dyn SnoozeStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Builds the filter and its backing store from `config`.
    ///
    /// The in-memory backend starts its reaper, so this must run inside a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::InvalidConfig` if the Redis backend is selected
    /// without a usable URL and `SnoozeError::StoreUnavailable` if the Redis
    /// server cannot be reached.
    pub async fn from_config(config: &FilterConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Same as [`AlertFilter::from_config`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`AlertFilter::from_config`].
    pub async fn from_config_with_clock(
        config: &FilterConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn SnoozeStore> = match config.backend {
            FilterBackend::InMemory => Arc::new(InMemoryStore::with_reaper(
                config.reaper_interval,
                Arc::clone(&clock),
            )),
            FilterBackend::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    SnoozeError::InvalidConfig {
                        reason: "redis url is not set".to_string(),
                    }
                })?;
                Arc::new(RedisStore::connect(url).await?)
            }
        };

        info!(backend = %store.name(), "alert filter ready");
        Ok(Self::with_clock(store, clock))
    }

    /// Returns the name of the backing store.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Returns the storage key for a channel and rule.
    #[must_use]
    pub fn key(channel: &str, rule_url: &str) -> String {
        SnoozeKey::new(channel, rule_url).storage_key()
    }

    /// Snoozes `rule_url` in `channel` for `minutes`.
    ///
    /// A zero duration wakes the rule instead. Any existing snooze for the
    /// same channel and rule is replaced, never extended.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::InvalidArgument` for a negative or oversized
    /// duration or a channel containing the key separator, and propagates
    /// store errors unchanged.
    pub async fn snooze(
        &self,
        channel: &str,
        title: &str,
        rule_url: &str,
        snoozed_by: &str,
        minutes: i64,
    ) -> Result<()> {
        if minutes < 0 {
            return Err(SnoozeError::InvalidArgument {
                reason: format!("snooze minutes must not be negative, got {minutes}"),
            });
        }

        if channel.contains(KEY_SEPARATOR) {
            return Err(SnoozeError::InvalidArgument {
                reason: format!("channel '{channel}' must not contain '{KEY_SEPARATOR}'"),
            });
        }

        let key = SnoozeKey::new(channel, rule_url);
        if minutes == 0 {
            return self.wake(&key.storage_key()).await;
        }

        let ttl = Duration::try_minutes(minutes).ok_or_else(|| SnoozeError::InvalidArgument {
            reason: format!("snooze of {minutes} minutes is out of range"),
        })?;
        let until = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| SnoozeError::InvalidArgument {
                reason: format!("snooze of {minutes} minutes is out of range"),
            })?;

        let record = SnoozeRecord::new(&key, title, snoozed_by, until);
        self.store.put(&key, record, ttl).await?;

        info!(
            key = %key,
            snoozed_by = %snoozed_by,
            minutes,
            until = %until,
            "snoozed alert"
        );
        Ok(())
    }

    /// Removes the snooze stored under `key`. Waking a key that is not
    /// snoozed is not an error.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn wake(&self, key: &str) -> Result<()> {
        self.store.remove(key).await?;
        info!(key = %key, "woke alert");
        Ok(())
    }

    /// Returns `true` if alerts for `rule_url` in `channel` are currently
    /// suppressed.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn is_snoozed(&self, channel: &str, rule_url: &str) -> Result<bool> {
        let key = SnoozeKey::new(channel, rule_url);
        let snoozed = self.store.is_live(&key, self.clock.now()).await?;
        debug!(key = %key, snoozed, "checked snooze");
        Ok(snoozed)
    }

    /// Returns every live snooze of `channel`, keyed by storage key.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub async fn list_by_channel(&self, channel: &str) -> Result<ChannelSnoozes> {
        let snoozes = self.store.list_channel(channel, self.clock.now()).await?;
        debug!(channel = %channel, count = snoozes.len(), "listed snoozes");
        Ok(snoozes)
    }

    /// Stops background work owned by the backing store.
    pub async fn shutdown(&self) {
        self.store.shutdown().await;
        debug!(backend = %self.store.name(), "alert filter shut down");
    }
}
