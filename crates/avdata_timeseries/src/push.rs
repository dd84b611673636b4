//! Push transport seam.

use crate::error::{PushError, TimeSeriesError};

/// Outbound delivery of a compressed record.
///
/// Implemented by the transport layer; tests use a recording mock.
pub trait Uplink: Send + Sync {
    /// Delivers one opaque payload.
    ///
    /// # Errors
    ///
    /// [`PushError`] if the payload was not accepted.
    fn push(&self, payload: &[u8]) -> Result<(), PushError>;
}

impl<U: Uplink + ?Sized> Uplink for std::sync::Arc<U> {
    fn push(&self, payload: &[u8]) -> Result<(), PushError> {
        (**self).push(payload)
    }
}

/// Compresses `payload` with zstd, refusing results above `limit` bytes.
pub(crate) fn compress(payload: &[u8], level: i32, limit: usize) -> Result<Vec<u8>, TimeSeriesError> {
    let compressed = zstd::encode_all(payload, level)
        .map_err(|err| TimeSeriesError::fault(format!("compression failed: {err}")))?;
    if compressed.len() > limit {
        return Err(TimeSeriesError::fault(format!(
            "compressed record of {} bytes exceeds {limit} bytes",
            compressed.len()
        )));
    }
    Ok(compressed)
}
