//! Time-windowed alert suppression for chat alert relays.
//!
//! `snooze-filter` decides whether an incoming alert should be dropped
//! because a user snoozed its rule in the destination channel, expires
//! snoozes on their own, and lists or wakes the snoozes of a channel.
//!
//! # Features
//!
//! - **Snoozes**: Suppress one rule in one channel for a number of minutes
//! - **Replacement**: A new snooze for the same rule replaces the old one
//! - **Wake**: Cancel a snooze early, idempotently
//! - **Backends**: In-process map with a reaper, or Redis with native TTL
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use snooze_filter::{AlertFilter, InMemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> snooze_filter::Result<()> {
//! let filter = AlertFilter::new(Arc::new(InMemoryStore::new()));
//!
//! filter
//!     .snooze("alerts", "Disk full", "https://rules/42", "alice", 15)
//!     .await?;
//! assert!(filter.is_snoozed("alerts", "https://rules/42").await?);
//!
//! let snoozed = filter.list_by_channel("alerts").await?;
//! assert_eq!(snoozed.len(), 1);
//!
//! filter.wake(&AlertFilter::key("alerts", "https://rules/42")).await?;
//! assert!(!filter.is_snoozed("alerts", "https://rules/42").await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Choosing a backend
//!
//! ```rust,ignore
//! use snooze_filter::{AlertFilter, FilterBackend, FilterConfig};
//!
//! let config = FilterConfig::default()
//!     .with_backend(FilterBackend::Redis)
//!     .with_redis_url("redis://localhost:6379/0");
//! let filter = AlertFilter::from_config(&config).await?;
//! // ... serve requests ...
//! filter.shutdown().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod memory;
pub mod redis_store;
pub mod relay;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FilterBackend, FilterConfig};
pub use error::{Result, SnoozeError};
pub use filter::AlertFilter;
pub use memory::{DEFAULT_REAPER_INTERVAL, InMemoryStore};
pub use redis_store::RedisStore;
pub use relay::{
    AlertNotice, AlertRelay, Delivery, EvalMatch, GrafanaAlert, GrafanaAlertState, SnoozeAction,
    SnoozeOption,
};
pub use store::{ChannelSnoozes, SnoozeStore};
pub use types::{SnoozeKey, SnoozeRecord};
