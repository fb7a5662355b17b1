//! Redis-backed snooze store.
//!
//! Each snooze is one Redis string holding the JSON-encoded
//! [`SnoozeRecord`], written with `SET .. EX` so Redis drops it when the
//! snooze ends. Presence of a key therefore means the snooze is live and no
//! client-side reaping is needed.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::error::{Result, SnoozeError};
use crate::store::{ChannelSnoozes, SnoozeStore};
use crate::types::{KEY_SEPARATOR, SnoozeKey, SnoozeRecord};

/// Snooze store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the Redis server at `url` and checks it answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::InvalidConfig` if `url` cannot be parsed and
    /// `SnoozeError::StoreUnavailable` if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| SnoozeError::InvalidConfig {
            reason: format!("invalid redis url: {e}"),
        })?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("connected to redis");
        Ok(Self { conn })
    }

    /// Wraps an existing connection.
    #[must_use]
    pub const fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SnoozeStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn put(&self, key: &SnoozeKey, record: SnoozeRecord, ttl: Duration) -> Result<()> {
        let seconds = u64::try_from(ttl.num_seconds())
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| SnoozeError::InvalidArgument {
                reason: format!("snooze ttl must be at least one second, got {ttl}"),
            })?;
        let payload = serde_json::to_string(&record)?;
        let storage_key = key.storage_key();

        let mut conn = self.conn.clone();
        let () = conn.set_ex(&storage_key, payload, seconds).await?;

        debug!(key = %storage_key, ttl_secs = seconds, "stored snooze in redis");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        debug!(key = %key, removed, "removed snooze from redis");
        Ok(())
    }

    async fn is_live(&self, key: &SnoozeKey, _now: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key.storage_key()).await?;
        Ok(exists)
    }

    async fn list_channel(&self, channel: &str, _now: DateTime<Utc>) -> Result<ChannelSnoozes> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(channel_pattern(channel)).await?;
        if keys.is_empty() {
            return Ok(ChannelSnoozes::new());
        }

        // MGET keeps one slot per key, with nil for keys that expired since KEYS.
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        collect_channel(channel, keys, values)
    }
}

/// Decodes the `MGET` reply for `keys` into the snoozes of `channel`.
///
/// Nil slots are keys that expired after `KEYS` ran and are skipped. The
/// glob also matches channels that merely start with `channel;`, so records
/// of other channels are dropped here.
fn collect_channel(
    channel: &str,
    keys: Vec<String>,
    values: Vec<Option<String>>,
) -> Result<ChannelSnoozes> {
    let mut snoozes = ChannelSnoozes::with_capacity(keys.len());
    for (key, raw) in keys.into_iter().zip(values) {
        let Some(raw) = raw else {
            debug!(key = %key, "snooze expired during listing");
            continue;
        };
        let record: SnoozeRecord = serde_json::from_str(&raw)?;
        if record.channel != channel {
            continue;
        }
        snoozes.insert(key, record);
    }
    Ok(snoozes)
}

/// Builds the `KEYS` glob matching every snooze of `channel`.
fn channel_pattern(channel: &str) -> String {
    let mut pattern = String::with_capacity(channel.len() + 2);
    for c in channel.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push(KEY_SEPARATOR);
    pattern.push('*');
    pattern
}
