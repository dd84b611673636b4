//! Resource-data core of a device-management agent.
//!
//! - [`avdata_store`]: path-addressed asset values with access control and a
//!   multi-value CBOR codec
//! - [`avdata_timeseries`]: bounded, compressed batches of timestamped samples
//! - [`avdata_service`]: request dispatch between the transport and the store

pub use avdata_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use avdata_internal::prelude::*;
}
