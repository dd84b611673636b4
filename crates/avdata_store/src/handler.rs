//! Resource event handlers.
//!
//! A handler is attached to one resource path and is told about server-side
//! reads, writes and execute requests on it. Handlers run with no store lock
//! held, so they may call back into the [`AssetStore`] they receive.
//!
//! Any `Fn(&ResourceEvent<'_>)` closure is a handler:
//!
//! ```
//! use avdata_store::{AccessMode, Action, AssetStore, Origin, Value};
//!
//! let store = AssetStore::new();
//! store.create("/sensor/temp", AccessMode::Variable).unwrap();
//! store
//!     .add_handler("/sensor/temp", |event: &avdata_store::ResourceEvent<'_>| {
//!         if event.action == Action::Read {
//!             event
//!                 .store
//!                 .set(event.path, Value::Float(21.5), Origin::Client)
//!                 .unwrap();
//!         }
//!     })
//!     .unwrap();
//!
//! let value = store.get("/sensor/temp", Origin::Server).unwrap();
//! assert_eq!(value, Value::Float(21.5));
//! ```

use crate::access::Action;
use crate::args::ArgumentList;
use crate::store::AssetStore;
use std::sync::Arc;

/// Context passed to a [`ResourceHandler`].
#[derive(Debug, Clone, Copy)]
pub struct ResourceEvent<'a> {
    /// Store the event originates from.
    pub store: &'a AssetStore,
    /// Path of the resource.
    pub path: &'a str,
    /// What the server did.
    pub action: Action,
    /// Execute arguments; empty for reads and writes.
    pub args: &'a ArgumentList,
}

/// Callback interface for resource events.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Handles one event.
    fn on_event(&self, event: &ResourceEvent<'_>);
}

impl<F> ResourceHandler for F
where
    F: Fn(&ResourceEvent<'_>) + Send + Sync + 'static,
{
    fn on_event(&self, event: &ResourceEvent<'_>) {
        self(event);
    }
}

/// Opaque reference returned when a handler is registered.
///
/// Pass it to [`AssetStore::remove_handler`] to detach the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerToken(pub(crate) u64);

/// A handler bound to a resource together with its token.
#[derive(Clone)]
pub(crate) struct RegisteredHandler {
    pub(crate) token: HandlerToken,
    pub(crate) handler: Arc<dyn ResourceHandler>,
}

impl core::fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
