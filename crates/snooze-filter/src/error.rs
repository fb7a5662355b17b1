//! Error types for the snooze-filter crate.

use thiserror::Error;

/// Errors that can occur while snoozing, waking or checking alerts.
#[derive(Debug, Error)]
pub enum SnoozeError {
    /// A caller-supplied argument was rejected before touching the store.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected.
        reason: String,
    },

    /// The backing store could not be reached or rejected the command.
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// Underlying transport or command error.
        reason: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An inbound action or alert carried no usable rule reference.
    #[error("key extraction failed: {reason}")]
    KeyExtractionFailed {
        /// What was missing.
        reason: String,
    },

    /// The selected backend is missing the settings it needs.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_json::Error> for SnoozeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for SnoozeError {
    fn from(err: redis::RedisError) -> Self {
        Self::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Result type for snooze operations.
pub type Result<T> = std::result::Result<T, SnoozeError>;
