//! Capacity-checked encode buffer.

use crate::error::CodecError;
use core::fmt;

/// Write error raised when a [`BoundedBuffer`] would grow past its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Configured capacity.
    pub capacity: usize,
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer capacity of {} bytes exceeded", self.capacity)
    }
}

impl std::error::Error for CapacityExceeded {}

/// A growable byte buffer with a hard upper bound.
///
/// Implements [`minicbor::encode::Write`], so an encoder writing into it
/// fails cleanly instead of truncating once the bound is reached.
///
/// # Example
///
/// ```
/// use avdata_store::codec::BoundedBuffer;
/// use minicbor::Encoder;
///
/// let mut enc = Encoder::new(BoundedBuffer::with_capacity(4));
/// assert!(enc.str("abc").is_ok());
/// assert!(enc.str("abc").is_err());
/// assert_eq!(enc.into_writer().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl BoundedBuffer {
    /// Creates an empty buffer that refuses to grow beyond `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer and returns the written bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl minicbor::encode::Write for BoundedBuffer {
    type Error = CapacityExceeded;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        if self.bytes.len() + buf.len() > self.capacity {
            return Err(CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.bytes.extend_from_slice(buf);
        Ok(())
    }
}

impl From<minicbor::encode::Error<CapacityExceeded>> for CodecError {
    fn from(err: minicbor::encode::Error<CapacityExceeded>) -> Self {
        if err.is_write() {
            Self::BufferFull
        } else {
            Self::fault(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minicbor::Encoder;

    #[test]
    fn overflow_maps_to_buffer_full() {
        let mut enc = Encoder::new(BoundedBuffer::with_capacity(3));
        enc.u8(1).unwrap();
        let err = enc.str("abc").unwrap_err();

        assert_eq!(CodecError::from(err), CodecError::BufferFull);
        assert!(enc.writer().len() <= 3);
    }

    #[test]
    fn message_errors_map_to_fault() {
        let err = minicbor::encode::Error::<CapacityExceeded>::message("boom");
        assert!(matches!(CodecError::from(err), CodecError::Fault(_)));
    }
}
