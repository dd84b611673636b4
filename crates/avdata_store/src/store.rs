//! The asset data store.
//!
//! [`AssetStore`] maps normalized paths to typed, access-controlled values.
//! Paths are independent keys, but no path may be an ancestor or descendant
//! of another, so the set of paths always forms the leaves of a tree.
//!
//! # Re-entrancy
//!
//! All operations take `&self`. Store locks are released before a handler
//! runs, so a handler may read or write other resources (or the same one)
//! through the [`ResourceEvent::store`] it receives.

use crate::access::{Access, AccessMode, Action, Origin};
use crate::args::ArgumentList;
use crate::codec::{DecodeReport, decode_subtree, encode_subtree};
use crate::error::StoreError;
use crate::handler::{HandlerToken, RegisteredHandler, ResourceEvent, ResourceHandler};
use crate::path;
use crate::value::{DataType, Value};
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use minicbor::Decoder;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A single store entry.
#[derive(Debug)]
struct Resource {
    mode: AccessMode,
    value: Value,
    handler: Option<RegisteredHandler>,
}

impl Resource {
    fn check(&self, path: &str, origin: Origin, action: Action) -> Result<(), StoreError> {
        let required = action.required();
        if self.mode.access_for(origin).contains(required) {
            return Ok(());
        }
        tracing::warn!(path, %origin, %required, "access denied");
        Err(StoreError::NotPermitted {
            path: path.to_owned(),
            origin,
            required,
        })
    }

    /// Handler to notify for a server-side access.
    fn server_handler(&self, origin: Origin) -> Option<RegisteredHandler> {
        match origin {
            Origin::Server => self.handler.clone(),
            Origin::Client => None,
        }
    }
}

/// Path-addressed store of asset resources.
///
/// # Example
///
/// ```
/// use avdata_store::{AccessMode, AssetStore, Origin, StoreError, Value};
///
/// let store = AssetStore::new();
/// store.create("/a/b", AccessMode::Setting).unwrap();
///
/// // Nothing set yet.
/// assert_eq!(store.get("/a/b", Origin::Client).unwrap(), Value::None);
///
/// // Settings are written by the server and read by the client.
/// store.set("/a/b", Value::Int(5), Origin::Server).unwrap();
/// assert_eq!(store.get_int("/a/b").unwrap(), 5);
/// assert!(matches!(
///     store.set("/a/b", Value::Int(6), Origin::Client),
///     Err(StoreError::NotPermitted { .. })
/// ));
/// ```
#[derive(Default)]
pub struct AssetStore {
    resources: RwLock<HashMap<String, Resource>>,
    handler_paths: Mutex<HashMap<HandlerToken, String>>,
    next_token: AtomicU64,
}

impl core::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AssetStore")
            .field("paths", &self.paths())
            .finish_non_exhaustive()
    }
}

impl AssetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resource holding [`Value::None`].
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidPath`] if the path is malformed or reserved
    /// - [`StoreError::Duplicate`] if the path exists, or is an ancestor or
    ///   descendant of an existing path
    pub fn create(&self, path: &str, mode: AccessMode) -> Result<(), StoreError> {
        path::validate(path)?;

        let mut resources = self.resources.write();
        let overlaps = resources.contains_key(path)
            || resources
                .keys()
                .any(|existing| path::is_subpath(path, existing) || path::is_subpath(existing, path));
        if overlaps {
            return Err(StoreError::Duplicate(path.to_owned()));
        }

        resources.insert(
            path.to_owned(),
            Resource {
                mode,
                value: Value::None,
                handler: None,
            },
        );
        tracing::debug!(path, ?mode, "resource created");
        Ok(())
    }

    /// Reads a resource value.
    ///
    /// For server reads, the resource handler (if any) is invoked with
    /// [`Action::Read`] before the value is taken, so it can refresh it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the path does not exist
    /// - [`StoreError::NotPermitted`] if `origin` lacks read access
    pub fn get(&self, path: &str, origin: Origin) -> Result<Value, StoreError> {
        let handler = {
            let resources = self.resources.read();
            let resource = resources
                .get(path)
                .ok_or_else(|| StoreError::not_found(path))?;
            resource.check(path, origin, Action::Read)?;
            resource.server_handler(origin)
        };

        if let Some(handler) = handler {
            self.notify(&handler, path, Action::Read, &ArgumentList::new());
        }

        self.resources
            .read()
            .get(path)
            .map(|resource| resource.value.clone())
            .ok_or_else(|| StoreError::not_found(path))
    }

    /// Replaces a resource value and its type.
    ///
    /// For server writes, the resource handler (if any) is invoked with
    /// [`Action::Write`] after the value is committed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the path does not exist
    /// - [`StoreError::NotPermitted`] if `origin` lacks write access
    /// - [`StoreError::ValueTooLong`] if a string value is too long
    pub fn set(&self, path: &str, value: Value, origin: Origin) -> Result<(), StoreError> {
        let handler = {
            let mut resources = self.resources.write();
            let resource = resources
                .get_mut(path)
                .ok_or_else(|| StoreError::not_found(path))?;
            resource.check(path, origin, Action::Write)?;
            value.validate()?;
            tracing::debug!(path, %origin, data_type = %value.data_type(), "value set");
            resource.value = value;
            resource.server_handler(origin)
        };

        if let Some(handler) = handler {
            self.notify(&handler, path, Action::Write, &ArgumentList::new());
        }
        Ok(())
    }

    /// Runs the command handler of a resource with `args`.
    ///
    /// Completion is reported separately by whoever handles the command.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the path does not exist
    /// - [`StoreError::NotPermitted`] if the server lacks execute access
    /// - [`StoreError::NoHandler`] if no handler is registered
    pub fn execute(&self, path: &str, args: &ArgumentList) -> Result<(), StoreError> {
        let handler = {
            let resources = self.resources.read();
            let resource = resources
                .get(path)
                .ok_or_else(|| StoreError::not_found(path))?;
            resource.check(path, Origin::Server, Action::Execute)?;
            resource
                .handler
                .clone()
                .ok_or_else(|| StoreError::NoHandler(path.to_owned()))?
        };

        self.notify(&handler, path, Action::Execute, args);
        Ok(())
    }

    fn notify(&self, handler: &RegisteredHandler, path: &str, action: Action, args: &ArgumentList) {
        tracing::debug!(path, ?action, token = ?handler.token, "invoking resource handler");
        handler.handler.on_event(&ResourceEvent {
            store: self,
            path,
            action,
            args,
        });
    }

    /// Attaches a handler to a resource, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the path does not exist.
    pub fn add_handler(
        &self,
        path: &str,
        handler: impl ResourceHandler,
    ) -> Result<HandlerToken, StoreError> {
        let token = HandlerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let registered = RegisteredHandler {
            token,
            handler: Arc::new(handler),
        };

        let previous = {
            let mut resources = self.resources.write();
            let Some(resource) = resources.get_mut(path) else {
                tracing::warn!(path, "handler registered on unknown path");
                return Err(StoreError::not_found(path));
            };
            resource.handler.replace(registered)
        };

        let mut handler_paths = self.handler_paths.lock();
        if let Some(previous) = previous {
            handler_paths.remove(&previous.token);
        }
        handler_paths.insert(token, path.to_owned());
        Ok(token)
    }

    /// Detaches the handler registered under `token`.
    ///
    /// Unknown or replaced tokens are ignored.
    pub fn remove_handler(&self, token: HandlerToken) {
        let Some(path) = self.handler_paths.lock().remove(&token) else {
            return;
        };
        let mut resources = self.resources.write();
        if let Some(resource) = resources.get_mut(&path)
            && resource.handler.as_ref().is_some_and(|h| h.token == token)
        {
            resource.handler = None;
        }
    }

    fn typed<T>(
        &self,
        path: &str,
        expected: DataType,
        extract: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T, StoreError> {
        let value = self.get(path, Origin::Client)?;
        if value.is_none() {
            return Err(StoreError::Unavailable(path.to_owned()));
        }
        extract(&value).ok_or_else(|| {
            tracing::error!(path, %expected, actual = %value.data_type(), "wrong type accessed");
            StoreError::TypeMismatch {
                path: path.to_owned(),
                expected,
                actual: value.data_type(),
            }
        })
    }

    /// Reads an integer as the client.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if no value is set,
    /// [`StoreError::TypeMismatch`] for another type, or as [`Self::get`].
    pub fn get_int(&self, path: &str) -> Result<i32, StoreError> {
        self.typed(path, DataType::Int, Value::as_int)
    }

    /// Reads a float as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::get_int`].
    pub fn get_float(&self, path: &str) -> Result<f64, StoreError> {
        self.typed(path, DataType::Float, Value::as_float)
    }

    /// Reads a boolean as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::get_int`].
    pub fn get_bool(&self, path: &str) -> Result<bool, StoreError> {
        self.typed(path, DataType::Bool, Value::as_bool)
    }

    /// Reads a string as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::get_int`].
    pub fn get_string(&self, path: &str) -> Result<String, StoreError> {
        self.typed(path, DataType::String, |v| v.as_str().map(str::to_owned))
    }

    /// Writes an integer as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::set`].
    pub fn set_int(&self, path: &str, value: i32) -> Result<(), StoreError> {
        self.set(path, Value::Int(value), Origin::Client)
    }

    /// Writes a float as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::set`].
    pub fn set_float(&self, path: &str, value: f64) -> Result<(), StoreError> {
        self.set(path, Value::Float(value), Origin::Client)
    }

    /// Writes a boolean as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::set`].
    pub fn set_bool(&self, path: &str, value: bool) -> Result<(), StoreError> {
        self.set(path, Value::Bool(value), Origin::Client)
    }

    /// Writes a string as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::set`].
    pub fn set_string(&self, path: &str, value: &str) -> Result<(), StoreError> {
        self.set(path, Value::from(value), Origin::Client)
    }

    /// Clears a value as the client.
    ///
    /// # Errors
    ///
    /// As [`Self::set`].
    pub fn set_null(&self, path: &str) -> Result<(), StoreError> {
        self.set(path, Value::None, Origin::Client)
    }

    /// Returns `true` if `path` lies above at least one resource.
    #[must_use]
    pub fn is_ancestor_of_any(&self, path: &str) -> bool {
        self.resources
            .read()
            .keys()
            .any(|existing| path::is_subpath(path, existing))
    }

    /// Returns `true` if `path` lies below at least one resource.
    #[must_use]
    pub fn is_descendant_of_any(&self, path: &str) -> bool {
        self.resources
            .read()
            .keys()
            .any(|existing| path::is_subpath(existing, path))
    }

    /// Returns `true` if a resource exists at exactly `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.resources.read().contains_key(path)
    }

    /// Returns the server access mask of a resource.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the path does not exist.
    pub fn server_access(&self, path: &str) -> Result<Access, StoreError> {
        self.access(path, Origin::Server)
    }

    /// Returns the client access mask of a resource.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the path does not exist.
    pub fn client_access(&self, path: &str) -> Result<Access, StoreError> {
        self.access(path, Origin::Client)
    }

    fn access(&self, path: &str, origin: Origin) -> Result<Access, StoreError> {
        self.resources
            .read()
            .get(path)
            .map(|resource| resource.mode.access_for(origin))
            .ok_or_else(|| StoreError::not_found(path))
    }

    /// Returns every resource path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.resources.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Returns `true` if the store holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Encodes every server-readable resource below `path` as nested maps.
    ///
    /// Each value is read through [`Self::get`] with [`Origin::Server`], so
    /// read handlers run. Encoding starts at the segment just below `path`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no resource lies below `path`
    /// - [`StoreError::Codec`] if the output exceeds `capacity` bytes
    pub fn read_subtree(&self, path: &str, capacity: usize) -> Result<Vec<u8>, StoreError> {
        let readable = {
            let resources = self.resources.read();
            let mut below = resources
                .iter()
                .filter(|(existing, _)| path::is_subpath(path, existing))
                .peekable();
            if below.peek().is_none() {
                return Err(StoreError::not_found(path));
            }
            let mut readable: Vec<String> = below
                .filter(|(_, resource)| resource.mode.server_access().contains(Access::READ))
                .map(|(existing, _)| existing.clone())
                .collect();
            readable.sort();
            readable
        };

        let mut entries = Vec::with_capacity(readable.len());
        for existing in readable {
            let value = self.get(&existing, Origin::Server)?;
            entries.push((existing, value));
        }

        tracing::debug!(path, count = entries.len(), "encoding subtree");
        Ok(encode_subtree(&entries, path::depth(path) + 1, capacity)?)
    }

    /// Applies a nested map payload below `path`.
    ///
    /// Each leaf is written through [`Self::set`] with `origin`. Entries that
    /// fail are collected in the report and do not stop the others.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no resource lies below `path`
    /// - [`StoreError::Codec`] if the payload is malformed
    pub fn write_subtree(
        &self,
        path: &str,
        payload: &[u8],
        origin: Origin,
    ) -> Result<DecodeReport, StoreError> {
        if !self.is_ancestor_of_any(path) {
            return Err(StoreError::not_found(path));
        }
        let mut dec = Decoder::new(payload);
        let report = decode_subtree(&mut dec, path, &mut |leaf: &str, value| {
            self.set(leaf, value, origin)
        })?;
        tracing::debug!(
            path,
            applied = report.applied,
            failed = report.failures.len(),
            "subtree written"
        );
        Ok(report)
    }
}
