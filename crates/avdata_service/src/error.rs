//! Service error types.

use avdata_store::StoreError;
use avdata_timeseries::TimeSeriesError;
use thiserror::Error;

/// Errors returned by [`AssetDataService`](crate::AssetDataService) and its
/// configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// An execute reply was sent with no execute outstanding.
    #[error("no execute request is awaiting a reply")]
    NoPendingExec,

    /// The transport failed to deliver a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The configuration is malformed or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A time-series operation failed.
    #[error(transparent)]
    TimeSeries(#[from] TimeSeriesError),
}

impl ServiceError {
    /// Creates a [`Transport`](Self::Transport) error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a [`Config`](Self::Config) error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
