//! Error types for collection and exposition.

use infobridge_core::CoreError;
use thiserror::Error;

/// Result type alias for collect and encode operations.
pub type CollectResult<T> = Result<T, CollectError>;

/// Failures that abort a single collect invocation.
///
/// Store outages are not represented here: they are logged and reported
/// through the `up` gauge instead.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("metric routing contract violated: {0}")]
    Contract(#[from] CoreError),

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}
