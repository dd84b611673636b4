//! Time-series batching of asset samples.
//!
//! A [`TimeSeriesRecord`] accumulates samples of named resources at `u64`
//! timestamps, keeps a CBOR encoding of the batch below a fixed size, and
//! pushes it zstd-compressed through an [`Uplink`].
//!
//! # Quick Start
//!
//! ```
//! use avdata_timeseries::{PushError, TimeSeriesRecord, Uplink};
//!
//! struct Discard;
//!
//! impl Uplink for Discard {
//!     fn push(&self, _payload: &[u8]) -> Result<(), PushError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut record = TimeSeriesRecord::new();
//! record.add_float("/engine/rpm", 1200.0, 1_700_000_000).unwrap();
//! record.add_float("/engine/rpm", 1250.0, 1_700_000_010).unwrap();
//!
//! record.push(&Discard).unwrap();
//! assert!(record.is_empty());
//! ```
//!
//! # Architecture
//!
//! - [`TimeSeriesRecord`]: samples, bounded encode with rollback, push
//! - [`RecordConfig`]: buffer size and compression level
//! - [`Uplink`]: outbound delivery seam
//! - [`RecordRegistry`]: records owned by client sessions

pub mod config;
pub mod error;
pub mod push;
pub mod record;
pub mod registry;

pub use config::{
    DEFAULT_BUFFER_BYTES, RecordConfig, is_valid_compression_level, max_compression_level,
};
pub use error::{PushError, TimeSeriesError};
pub use push::Uplink;
pub use record::TimeSeriesRecord;
pub use registry::{RecordRef, RecordRegistry, SessionId};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        PushError, RecordConfig, RecordRef, RecordRegistry, SessionId, TimeSeriesError,
        TimeSeriesRecord, Uplink,
    };
}
