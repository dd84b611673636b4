//! Server request dispatch.
//!
//! [`AssetDataService`] turns inbound requests into [`AssetStore`]
//! operations and answers them through the [`Transport`].
//!
//! | Method | Target | Outcome |
//! |--------|--------|---------|
//! | Read | resource | 2.05 with the encoded value |
//! | Read | subtree | 2.05 with a nested map of readable resources |
//! | Write | resource | 2.04 once the value is set |
//! | Write | subtree | 2.04 if every entry applied, else 4.00 |
//! | Execute | command | no immediate response; see [`AssetDataService::reply_exec_result`] |
//!
//! Permission failures answer 4.01 and unknown paths 4.04.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::message::{Method, Request, Response, ResponseCode};
use crate::transport::Transport;
use avdata_store::codec::{decode_value, encode_value_to_vec};
use avdata_store::{Access, ArgumentList, AssetStore, Origin, StoreError, Value};
use avdata_timeseries::{RecordRef, RecordRegistry, TimeSeriesError};
use core::fmt::Display;
use minicbor::Decoder;
use minicbor::data::Type;
use parking_lot::Mutex;
use std::sync::Arc;

/// The execute request awaiting its reply.
#[derive(Debug)]
struct PendingExec {
    token: Vec<u8>,
    path: String,
    args: Arc<ArgumentList>,
}

/// Outcome of handling one request.
enum Outcome {
    Reply(ResponseCode, Vec<u8>),
    Deferred,
}

impl Outcome {
    fn code(code: ResponseCode) -> Self {
        Self::Reply(code, Vec::new())
    }
}

/// Dispatches server requests to an asset store.
///
/// # Example
///
/// ```
/// use avdata_service::{
///     AssetDataService, Method, Request, Response, ResponseCode, ServiceError, Transport,
/// };
/// use avdata_store::{AccessMode, AssetStore};
/// use avdata_timeseries::{PushError, Uplink};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Capture(Mutex<Vec<Response>>);
///
/// impl Uplink for Capture {
///     fn push(&self, _payload: &[u8]) -> Result<(), PushError> {
///         Ok(())
///     }
/// }
///
/// impl Transport for Capture {
///     fn respond(&self, response: Response) -> Result<(), ServiceError> {
///         self.0.lock().push(response);
///         Ok(())
///     }
/// }
///
/// let store = Arc::new(AssetStore::new());
/// store.create("/lamp/level", AccessMode::Variable).unwrap();
/// store.set_int("/lamp/level", 3).unwrap();
///
/// let transport = Arc::new(Capture::default());
/// let service = AssetDataService::new(Arc::clone(&store), transport.clone());
/// service.handle(Request::new(Method::Read, "/lamp/level")).unwrap();
///
/// assert_eq!(transport.0.lock()[0].code, ResponseCode::Content);
/// ```
pub struct AssetDataService {
    store: Arc<AssetStore>,
    transport: Arc<dyn Transport>,
    records: RecordRegistry,
    pending: Mutex<Option<PendingExec>>,
    config: ServiceConfig,
}

impl core::fmt::Debug for AssetDataService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AssetDataService")
            .field("store", &self.store)
            .field("records", &self.records.len())
            .field("pending", &*self.pending.lock())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AssetDataService {
    /// Creates a service with the default configuration.
    pub fn new(store: Arc<AssetStore>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(store, transport, ServiceConfig::default())
    }

    /// Creates a service with `config`.
    pub fn with_config(
        store: Arc<AssetStore>,
        transport: Arc<dyn Transport>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            transport,
            records: RecordRegistry::with_config(config.record_config()),
            pending: Mutex::new(None),
            config,
        }
    }

    /// Returns the store requests are applied to.
    #[must_use]
    pub fn store(&self) -> &Arc<AssetStore> {
        &self.store
    }

    /// Returns the time-series records created through this service.
    #[must_use]
    pub fn records(&self) -> &RecordRegistry {
        &self.records
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Handles one server request.
    ///
    /// Reads and writes are answered before returning. An accepted execute
    /// is answered later by [`Self::reply_exec_result`].
    ///
    /// # Errors
    ///
    /// Only transport failures are returned; request failures are answered
    /// with the matching response code.
    pub fn handle(&self, request: Request) -> Result<(), ServiceError> {
        let Request {
            path,
            method,
            payload,
            token,
        } = request;

        let outcome = match method {
            Method::Read => self.read(&path),
            Method::Write => self.write(&path, &payload),
            Method::Execute => self.execute(&path, &payload, &token),
            Method::Unsupported(code) => {
                tracing::warn!(path = %path, code, "unsupported request method");
                Outcome::code(ResponseCode::BadRequest)
            }
        };

        match outcome {
            Outcome::Reply(code, body) => {
                tracing::debug!(path = %path, ?method, %code, "responding");
                self.transport
                    .respond(Response::with_payload(code, token, body))
            }
            Outcome::Deferred => Ok(()),
        }
    }

    fn read(&self, path: &str) -> Outcome {
        let capacity = self.config.response_buffer_bytes;
        match self.store.get(path, Origin::Server) {
            Ok(value) => match encode_value_to_vec(&value, capacity) {
                Ok(body) => Outcome::Reply(ResponseCode::Content, body),
                Err(err) => {
                    tracing::error!(path, error = %err, "failed to encode value");
                    Outcome::code(ResponseCode::InternalError)
                }
            },
            Err(StoreError::NotPermitted { .. }) => Outcome::code(ResponseCode::Unauthorized),
            Err(StoreError::NotFound(_)) if self.store.is_ancestor_of_any(path) => {
                match self.store.read_subtree(path, capacity) {
                    Ok(body) => Outcome::Reply(ResponseCode::Content, body),
                    Err(err) => {
                        tracing::error!(path, error = %err, "failed to encode subtree");
                        Outcome::code(ResponseCode::InternalError)
                    }
                }
            }
            Err(err) => {
                tracing::debug!(path, error = %err, "read rejected");
                Outcome::code(ResponseCode::NotFound)
            }
        }
    }

    fn write(&self, path: &str, payload: &[u8]) -> Outcome {
        let mut dec = Decoder::new(payload);
        if matches!(dec.datatype(), Ok(Type::Map | Type::MapIndef)) {
            return self.write_subtree(path, payload);
        }

        let value = match decode_value(&mut dec) {
            Ok(Value::None) => {
                tracing::warn!(path, "write without a value");
                return Outcome::code(ResponseCode::BadRequest);
            }
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(path, error = %err, "undecodable write payload");
                return Outcome::code(ResponseCode::BadRequest);
            }
        };

        match self.store.set(path, value, Origin::Server) {
            Ok(()) => Outcome::code(ResponseCode::Changed),
            Err(StoreError::NotPermitted { .. }) => Outcome::code(ResponseCode::Unauthorized),
            Err(StoreError::NotFound(_)) => Outcome::code(ResponseCode::NotFound),
            Err(err) => {
                tracing::warn!(path, error = %err, "write rejected");
                Outcome::code(ResponseCode::BadRequest)
            }
        }
    }

    fn write_subtree(&self, path: &str, payload: &[u8]) -> Outcome {
        if self.store.contains(path) {
            tracing::warn!(path, "map written to a single resource");
            return Outcome::code(ResponseCode::BadRequest);
        }
        match self.store.write_subtree(path, payload, Origin::Server) {
            Ok(report) if report.is_success() => Outcome::code(ResponseCode::Changed),
            Ok(report) => {
                tracing::warn!(
                    path,
                    applied = report.applied,
                    failed = report.failures.len(),
                    "subtree write partially applied"
                );
                Outcome::code(ResponseCode::BadRequest)
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "subtree write rejected");
                Outcome::code(ResponseCode::BadRequest)
            }
        }
    }

    fn execute(&self, path: &str, payload: &[u8], token: &[u8]) -> Outcome {
        match self.store.server_access(path) {
            Ok(access) if access.contains(Access::EXECUTE) => {}
            Ok(_) => return Outcome::code(ResponseCode::Unauthorized),
            Err(_) => return Outcome::code(ResponseCode::NotFound),
        }

        let args = match ArgumentList::from_cbor(payload) {
            Ok(args) => Arc::new(args),
            Err(err) => {
                tracing::warn!(path, error = %err, "invalid execute arguments");
                return Outcome::code(ResponseCode::BadRequest);
            }
        };

        let replaced = self.pending.lock().replace(PendingExec {
            token: token.to_vec(),
            path: path.to_owned(),
            args: Arc::clone(&args),
        });

        match self.store.execute(path, &args) {
            Ok(()) => {
                if let Some(previous) = replaced {
                    tracing::warn!(
                        path = %previous.path,
                        "execute still awaiting a reply was replaced"
                    );
                }
                Outcome::Deferred
            }
            Err(err) => {
                self.restore_pending(token, replaced);
                tracing::error!(path, error = %err, "execute failed");
                let code = match err {
                    StoreError::NotFound(_) => ResponseCode::NotFound,
                    StoreError::NotPermitted { .. } => ResponseCode::Unauthorized,
                    _ => ResponseCode::InternalError,
                };
                Outcome::code(code)
            }
        }
    }

    /// Drops the failed execute and reinstates the one it displaced.
    fn restore_pending(&self, token: &[u8], previous: Option<PendingExec>) {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|p| p.token == token) {
            *pending = previous;
        }
    }

    /// Arguments of the execute awaiting a reply, if any.
    ///
    /// Lets a command handler that completes asynchronously keep reading
    /// its arguments after the handler call has returned.
    #[must_use]
    pub fn pending_args(&self) -> Option<Arc<ArgumentList>> {
        self.pending.lock().as_ref().map(|p| Arc::clone(&p.args))
    }

    /// Returns `true` if an execute is awaiting its reply.
    #[must_use]
    pub fn has_pending_exec(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Answers the execute awaiting a reply.
    ///
    /// `Ok` answers 2.04 and `Err` answers 5.00. The pending execute and its
    /// arguments are released either way.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoPendingExec`] if no execute is outstanding, or a
    /// transport error.
    pub fn reply_exec_result<E: Display>(&self, result: Result<(), E>) -> Result<(), ServiceError> {
        let pending = self
            .pending
            .lock()
            .take()
            .ok_or(ServiceError::NoPendingExec)?;

        let code = match result {
            Ok(()) => ResponseCode::Changed,
            Err(err) => {
                tracing::warn!(path = %pending.path, error = %err, "command reported failure");
                ResponseCode::InternalError
            }
        };
        tracing::debug!(path = %pending.path, %code, "execute replied");
        self.transport.respond(Response::empty(code, pending.token))
    }

    /// Pushes a registered record through the transport.
    ///
    /// # Errors
    ///
    /// As [`RecordRegistry::push`].
    pub fn push_record(&self, rec: RecordRef) -> Result<(), TimeSeriesError> {
        self.records.push(rec, &*self.transport)
    }
}
