//! Record configuration.

/// Default cap on an encoded record, in bytes.
pub const DEFAULT_BUFFER_BYTES: usize = 4096;

/// Highest compression level supported by zstd.
#[must_use]
pub fn max_compression_level() -> i32 {
    *zstd::compression_level_range().end()
}

/// Returns `true` if zstd accepts `level`.
#[must_use]
pub fn is_valid_compression_level(level: i32) -> bool {
    zstd::compression_level_range().contains(&level)
}

/// Limits applied to a [`TimeSeriesRecord`](crate::TimeSeriesRecord).
///
/// # Example
///
/// ```
/// use avdata_timeseries::RecordConfig;
///
/// let config = RecordConfig::default()
///     .with_buffer_bytes(1024)
///     .with_compression_level(3);
/// assert_eq!(config.buffer_bytes, 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordConfig {
    /// Maximum size of the encoded record, and of its compressed form.
    pub buffer_bytes: usize,
    /// zstd level used when pushing.
    pub compression_level: i32,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            compression_level: max_compression_level(),
        }
    }
}

impl RecordConfig {
    /// Sets the encoded size cap.
    #[must_use]
    pub fn with_buffer_bytes(mut self, bytes: usize) -> Self {
        self.buffer_bytes = bytes;
        self
    }

    /// Sets the zstd compression level.
    #[must_use]
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RecordConfig::default();
        assert_eq!(config.buffer_bytes, 4096);
        assert_eq!(config.compression_level, max_compression_level());
        assert!(config.compression_level >= 19);
        assert!(is_valid_compression_level(config.compression_level));
        assert!(!is_valid_compression_level(config.compression_level + 1));
    }
}
