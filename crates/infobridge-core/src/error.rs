//! Error types for the parsing and mapping engine.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Internal contract violations.
///
/// These never come from bad report data. They mean a field was routed to
/// a descriptor whose declared label shape does not match the sample.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("no metric descriptor registered for {0}")]
    UnknownDescriptor(String),

    #[error("metric {name} declares {expected} label(s) but sample supplied {got}")]
    LabelMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),
}
