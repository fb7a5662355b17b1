//! Process-local snooze store.
//!
//! Records live in a map behind a `parking_lot::RwLock`. Expired records are
//! dropped lazily when [`SnoozeStore::is_live`] runs into them, and eagerly
//! by a background reaper that sweeps the whole map on a fixed interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::store::{ChannelSnoozes, SnoozeStore};
use crate::types::{SnoozeKey, SnoozeRecord};

/// How often the reaper sweeps expired records by default.
pub const DEFAULT_REAPER_INTERVAL: StdDuration = StdDuration::from_secs(120);

type Records = Arc<RwLock<HashMap<String, SnoozeRecord>>>;

/// Snooze store backed by an in-process map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Records by storage key, including expired ones not yet reaped.
    records: Records,
    /// Background sweeper, if one was started.
    reaper: Mutex<Option<ReaperHandle>>,
}

impl InMemoryStore {
    /// Creates an empty store without a reaper.
    ///
    /// Expired records are still hidden and purged on access.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store and starts a reaper sweeping every `interval`.
    ///
    /// Must be called from within a Tokio runtime. The reaper stops when
    /// [`InMemoryStore::stop_reaper`] is awaited or the store is dropped.
    #[must_use]
    pub fn with_reaper(interval: StdDuration, clock: Arc<dyn Clock>) -> Self {
        let store = Self::new();
        let handle = ReaperHandle::spawn(Arc::clone(&store.records), interval, clock);
        *store.reaper.lock() = Some(handle);
        info!(interval_secs = interval.as_secs(), "started snooze reaper");
        store
    }

    /// Returns the number of stored records, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns `true` while a reaper is attached to this store.
    #[must_use]
    pub fn is_reaping(&self) -> bool {
        self.reaper.lock().is_some()
    }

    /// Removes every record that has ended at `now`.
    ///
    /// Returns the number of records removed.
    pub fn reap_expired(&self, now: DateTime<Utc>) -> usize {
        reap(&self.records, now)
    }

    /// Stops the reaper and waits for it to finish. Does nothing if no
    /// reaper is running.
    pub async fn stop_reaper(&self) {
        let handle = self.reaper.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
            info!("stopped snooze reaper");
        }
    }
}

#[async_trait]
impl SnoozeStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn put(&self, key: &SnoozeKey, record: SnoozeRecord, ttl: Duration) -> Result<()> {
        let storage_key = key.storage_key();
        debug!(key = %storage_key, ttl_secs = ttl.num_seconds(), "storing snooze");
        self.records.write().insert(storage_key, record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = self.records.write().remove(key).is_some();
        debug!(key = %key, removed, "removed snooze");
        Ok(())
    }

    async fn is_live(&self, key: &SnoozeKey, now: DateTime<Utc>) -> Result<bool> {
        let storage_key = key.storage_key();
        let records = self.records.upgradable_read();

        let live = records.get(&storage_key).map(|r| r.is_live_at(now));
        match live {
            None => Ok(false),
            Some(true) => Ok(true),
            Some(false) => {
                // The upgradable guard excludes writers, so the record checked
                // above is the one removed here.
                let mut records = RwLockUpgradableReadGuard::upgrade(records);
                records.remove(&storage_key);
                debug!(key = %storage_key, "purged expired snooze");
                Ok(false)
            }
        }
    }

    async fn list_channel(&self, channel: &str, now: DateTime<Utc>) -> Result<ChannelSnoozes> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|(_, r)| r.channel == channel && r.is_live_at(now))
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect())
    }

    async fn shutdown(&self) {
        self.stop_reaper().await;
    }
}

fn reap(records: &RwLock<HashMap<String, SnoozeRecord>>, now: DateTime<Utc>) -> usize {
    let mut records = records.write();
    let before = records.len();
    records.retain(|_, r| r.is_live_at(now));
    before - records.len()
}

/// Handle for the background reaper task.
///
/// Dropping the handle signals the task to stop.
#[derive(Debug)]
struct ReaperHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    fn spawn(records: Records, interval: StdDuration, clock: Arc<dyn Clock>) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            // `interval` panics on a zero period.
            let mut ticker = tokio::time::interval(interval.max(StdDuration::from_millis(1)));
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = reap(&records, clock.now());
                        debug!(removed, "reaped expired snoozes");
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("snooze reaper exited");
        });

        Self {
            stop,
            task: Some(task),
        }
    }

    async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 11, 0, 0, 0).unwrap()
    }

    fn record(channel: &str, rule_url: &str, minutes: i64) -> (SnoozeKey, SnoozeRecord) {
        let key = SnoozeKey::new(channel, rule_url);
        let record = SnoozeRecord::new(
            &key,
            "[Alerting] Alert title",
            "user_nick",
            start() + Duration::minutes(minutes),
        );
        (key, record)
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert!(!store.is_reaping());
        assert_eq!(store.name(), "in_memory");
    }

    #[tokio::test]
    async fn put_then_is_live() {
        let store = InMemoryStore::new();
        let (key, rec) = record("channel1", "rule1", 10);

        store.put(&key, rec, Duration::minutes(10)).await.unwrap();

        assert!(store.is_live(&key, start()).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_replaces_existing_record() {
        let store = InMemoryStore::new();
        let (key, first) = record("channel1", "rule1", 10);
        let (_, second) = record("channel1", "rule1", 30);

        store.put(&key, first, Duration::minutes(10)).await.unwrap();
        store.put(&key, second.clone(), Duration::minutes(30)).await.unwrap();

        let listed = store.list_channel("channel1", start()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.get(&key.storage_key()), Some(&second));
    }

    #[tokio::test]
    async fn is_live_purges_expired_record() {
        let store = InMemoryStore::new();
        let (key, rec) = record("channel1", "rule1", -10);
        store.put(&key, rec, Duration::zero()).await.unwrap();
        assert_eq!(store.len(), 1);

        assert!(!store.is_live(&key, start()).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn is_live_keeps_live_record() {
        let store = InMemoryStore::new();
        let (key, rec) = record("channel1", "rule1", 10);
        store.put(&key, rec, Duration::minutes(10)).await.unwrap();

        assert!(store.is_live(&key, start()).await.unwrap());
        assert!(store.is_live(&key, start()).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remove_absent_key_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.remove("channel1;rule1").await.is_ok());
        assert!(store.remove("channel1;rule1").await.is_ok());
    }

    #[tokio::test]
    async fn reap_expired_removes_only_ended_records() {
        let store = InMemoryStore::new();
        let (k1, expired) = record("channel1", "rule1", -10);
        let (k2, live) = record("channel1", "rule2", 10);
        store.put(&k1, expired, Duration::zero()).await.unwrap();
        store.put(&k2, live, Duration::minutes(10)).await.unwrap();

        assert_eq!(store.reap_expired(start()), 1);
        assert_eq!(store.len(), 1);
        assert!(store.is_live(&k2, start()).await.unwrap());
    }

    #[tokio::test]
    async fn list_channel_filters_channel_and_expiry() {
        let store = InMemoryStore::new();
        let (k1, r1) = record("channel1", "rule1", 10);
        let (k2, r2) = record("channel1", "rule2", -1);
        let (k3, r3) = record("channel2", "rule1", 10);
        store.put(&k1, r1.clone(), Duration::minutes(10)).await.unwrap();
        store.put(&k2, r2, Duration::zero()).await.unwrap();
        store.put(&k3, r3, Duration::minutes(10)).await.unwrap();

        let listed = store.list_channel("channel1", start()).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed.get("channel1;rule1"), Some(&r1));
        // Listing never purges, that is left to the reaper.
        assert_eq!(store.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_sweeps_on_interval() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = InMemoryStore::with_reaper(StdDuration::from_secs(120), clock.clone());
        assert!(store.is_reaping());

        let (key, rec) = record("channel1", "rule1", 10);
        store.put(&key, rec, Duration::minutes(10)).await.unwrap();
        clock.advance(Duration::minutes(11));
        assert_eq!(store.len(), 1);

        tokio::time::sleep(StdDuration::from_secs(121)).await;
        tokio::task::yield_now().await;

        assert!(store.is_empty());
        store.stop_reaper().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_reaper_no_longer_sweeps() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = InMemoryStore::with_reaper(StdDuration::from_secs(120), clock.clone());

        store.stop_reaper().await;
        assert!(!store.is_reaping());

        let (key, rec) = record("channel1", "rule1", 10);
        store.put(&key, rec, Duration::minutes(10)).await.unwrap();
        clock.advance(Duration::minutes(11));

        tokio::time::sleep(StdDuration::from_secs(600)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stop_reaper_twice_is_noop() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = InMemoryStore::with_reaper(DEFAULT_REAPER_INTERVAL, clock);

        store.stop_reaper().await;
        store.stop_reaper().await;
        assert!(!store.is_reaping());
    }
}
