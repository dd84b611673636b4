//! Error types for the asset store and its codec.

use crate::access::{Access, Origin};
use crate::value::DataType;
use thiserror::Error;

/// Errors returned by [`AssetStore`](crate::AssetStore) and
/// [`ArgumentList`](crate::ArgumentList) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No resource (or argument) exists under the given name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller's access mask does not allow the operation.
    #[error("{origin} has no {required} access to {path}")]
    NotPermitted {
        /// Path of the resource.
        path: String,
        /// Side that attempted the access.
        origin: Origin,
        /// Access bit that was missing.
        required: Access,
    },

    /// The path exists already, or overlaps an existing path.
    #[error("duplicate path: {0}")]
    Duplicate(String),

    /// The path is malformed or starts with a reserved segment.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The stored value is of a different type than requested.
    #[error("{path} holds {actual}, not {expected}")]
    TypeMismatch {
        /// Path of the resource.
        path: String,
        /// Type the caller asked for.
        expected: DataType,
        /// Type currently stored.
        actual: DataType,
    },

    /// The resource exists but holds no value yet.
    #[error("no value available at {0}")]
    Unavailable(String),

    /// A string value exceeds the maximum length.
    #[error("string of {len} bytes exceeds the {max} byte limit")]
    ValueTooLong {
        /// Length of the rejected string.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Execute was requested on a resource without a handler.
    #[error("no handler registered for {0}")]
    NoHandler(String),

    /// Encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Creates a [`NotFound`](Self::NotFound).
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates an [`InvalidPath`](Self::InvalidPath).
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}

/// Errors produced by the CBOR codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The payload is not shaped as expected (e.g. not a map).
    #[error("bad payload: {0}")]
    BadPayload(String),

    /// The payload is not well-formed CBOR.
    #[error("decode error: {0}")]
    Decode(String),

    /// The CBOR item has a type that cannot be stored.
    #[error("unsupported CBOR type: {0}")]
    UnsupportedType(String),

    /// The CBOR item is well-formed but its value does not fit the store.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The output would exceed its capacity.
    #[error("encode buffer full")]
    BufferFull,

    /// Unexpected encoder failure.
    #[error("encode fault: {0}")]
    Fault(String),
}

impl CodecError {
    /// Creates a [`BadPayload`](Self::BadPayload).
    pub fn bad_payload(msg: impl Into<String>) -> Self {
        Self::BadPayload(msg.into())
    }

    /// Creates a [`Fault`](Self::Fault).
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }
}

impl From<minicbor::decode::Error> for CodecError {
    fn from(err: minicbor::decode::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
