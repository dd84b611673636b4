//! Request handling between a management transport and the asset store.
//!
//! - [`AssetDataService`]: dispatches Read, Write and Execute requests and
//!   sends the deferred execute reply
//! - [`Transport`]: response delivery plus the time-series [`Uplink`]
//! - [`ServiceConfig`]: buffer sizes, compression and logging, loaded from JSON
//! - [`TracingSetup`]: installs the `tracing` subscriber
//!
//! [`Uplink`]: avdata_timeseries::Uplink

pub mod config;
pub mod error;
pub mod message;
pub mod service;
pub mod tracing_setup;
pub mod transport;

pub use config::{ServiceConfig, TracingSettings};
pub use error::ServiceError;
pub use message::{CONTENT_FORMAT_CBOR, Method, Request, Response, ResponseCode};
pub use service::AssetDataService;
pub use tracing_setup::{TracingFormat, TracingSetup};
pub use transport::Transport;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AssetDataService, Method, Request, Response, ResponseCode, ServiceConfig, ServiceError,
        Transport,
    };
}
