//! Asset data store for device-management agents.
//!
//! This crate holds the values an application exposes to its management
//! server, addressed by slash-separated paths, and converts between those
//! values and the CBOR payloads the server exchanges.
//!
//! # Quick Start
//!
//! ```
//! use avdata_store::{AccessMode, AssetStore, Origin, Value};
//!
//! let store = AssetStore::new();
//! store.create("/room/temp", AccessMode::Variable).unwrap();
//! store.create("/room/setpoint", AccessMode::Setting).unwrap();
//!
//! store.set_float("/room/temp", 21.5).unwrap();
//! store.set("/room/setpoint", Value::Int(20), Origin::Server).unwrap();
//!
//! // Everything readable below /room as one CBOR map.
//! let payload = store.read_subtree("/room", 4096).unwrap();
//! assert!(!payload.is_empty());
//! ```
//!
//! # Architecture
//!
//! | Item | Role |
//! |------|------|
//! | [`AssetStore`] | path-keyed values with per-side access masks |
//! | [`AccessMode`] | variable, setting or command |
//! | [`ResourceHandler`] | callback for server reads, writes and executes |
//! | [`ArgumentList`] | named arguments of one execute request |
//! | [`codec`] | single values and nested-map trees in CBOR |
//! | [`path`] | path validation and segment helpers |

pub mod access;
pub mod args;
pub mod codec;
pub mod error;
pub mod handler;
pub mod path;
pub mod store;
pub mod value;

pub use access::{Access, AccessMode, Action, Origin};
pub use args::{Argument, ArgumentList};
pub use codec::DecodeReport;
pub use error::{CodecError, StoreError};
pub use handler::{HandlerToken, ResourceEvent, ResourceHandler};
pub use store::AssetStore;
pub use value::{DataType, MAX_STRING_BYTES, Value};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Access, AccessMode, Action, ArgumentList, AssetStore, DataType, Origin, ResourceEvent,
        ResourceHandler, StoreError, Value,
    };
}
