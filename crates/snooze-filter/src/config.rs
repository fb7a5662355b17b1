//! Backend selection for the alert filter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnoozeError};
use crate::memory::DEFAULT_REAPER_INTERVAL;

/// Which store backs the alert filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterBackend {
    /// Process-local map with a periodic reaper.
    #[default]
    InMemory,
    /// Redis with native key expiry.
    Redis,
}

impl FilterBackend {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "in_memory",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for FilterBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterBackend {
    type Err = SnoozeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "in_memory" | "in-memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(SnoozeError::InvalidConfig {
                reason: format!("unknown filter backend '{other}'"),
            }),
        }
    }
}

/// Settings the alert filter is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Selected backend.
    pub backend: FilterBackend,
    /// Connection URL, required for [`FilterBackend::Redis`].
    pub redis_url: Option<String>,
    /// Sweep interval of the in-memory reaper.
    pub reaper_interval: Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            backend: FilterBackend::InMemory,
            redis_url: None,
            reaper_interval: DEFAULT_REAPER_INTERVAL,
        }
    }
}

impl FilterConfig {
    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: FilterBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the Redis URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Sets the reaper interval.
    #[must_use]
    pub const fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    /// Checks the settings are complete for the selected backend.
    ///
    /// # Errors
    ///
    /// Returns `SnoozeError::InvalidConfig` if Redis is selected without a
    /// URL or the reaper interval is zero.
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            FilterBackend::Redis
                if self.redis_url.as_deref().is_none_or(|u| u.trim().is_empty()) =>
            {
                Err(SnoozeError::InvalidConfig {
                    reason: "redis url is not set".to_string(),
                })
            }
            FilterBackend::InMemory if self.reaper_interval.is_zero() => {
                Err(SnoozeError::InvalidConfig {
                    reason: "reaper interval must be greater than zero".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
