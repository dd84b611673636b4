//! Error types for time-series records.

use crate::registry::RecordRef;
use avdata_store::{CodecError, DataType, StoreError};
use thiserror::Error;

/// Failure reported by an [`Uplink`](crate::Uplink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PushError(pub String);

impl PushError {
    /// Creates a push error from a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors returned by [`TimeSeriesRecord`](crate::TimeSeriesRecord) and
/// [`RecordRegistry`](crate::RecordRegistry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeSeriesError {
    /// A sample does not match the type fixed by the first sample.
    #[error("resource {name} holds {expected} samples, got {actual}")]
    TypeMismatch {
        /// Resource name.
        name: String,
        /// Type fixed by the first sample.
        expected: DataType,
        /// Type of the rejected sample.
        actual: DataType,
    },

    /// The sample has no value.
    #[error("resource {0} sample has no value")]
    UnsupportedValue(String),

    /// The sample value breaks a storage limit.
    #[error("resource {name} sample rejected: {source}")]
    InvalidValue {
        /// Resource name.
        name: String,
        /// The violated limit.
        source: StoreError,
    },

    /// The encoded record would exceed its buffer size.
    #[error("record buffer full")]
    BufferFull,

    /// Unexpected internal failure.
    #[error("time-series fault: {0}")]
    Fault(String),

    /// The uplink refused the payload.
    #[error("push failed: {0}")]
    Push(#[from] PushError),

    /// The record reference is not (or no longer) registered.
    #[error("unknown record {0:?}")]
    UnknownRecord(RecordRef),
}

impl TimeSeriesError {
    /// Creates a [`Fault`](Self::Fault).
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }
}

impl From<CodecError> for TimeSeriesError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::BufferFull => Self::BufferFull,
            other => Self::fault(other.to_string()),
        }
    }
}
