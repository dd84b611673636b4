//! # avdata Internal Library
//!
//! Re-exports the avdata crates for convenience.

/// Asset store, access control and CBOR codec.
pub use avdata_store;

/// Time-series records and push.
pub use avdata_timeseries;

/// Request dispatch, configuration and logging setup.
pub use avdata_service;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use avdata_service::prelude::*;
    pub use avdata_store::prelude::*;
    pub use avdata_timeseries::prelude::*;
}
