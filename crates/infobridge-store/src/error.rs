//! Error types for store access.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level failures talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("failed to connect: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("{command} failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: redis::RedisError,
    },

    #[error("{command} timed out after {after:?}")]
    Timeout {
        command: &'static str,
        after: Duration,
    },

    #[error("store connection unavailable: {0}")]
    Init(String),
}
