//! Shared test utilities for `avdata_service` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not every item is used by every test binary"
)]

use avdata_service::{AssetDataService, Response, ServiceError, Transport};
use avdata_store::{AccessMode, AssetStore};
use avdata_timeseries::{PushError, Uplink};
use parking_lot::Mutex;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDING TRANSPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Transport that records every response and pushed payload.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<Vec<Response>>,
    pushes: Mutex<Vec<Vec<u8>>>,
}

impl RecordingTransport {
    /// Removes and returns the recorded responses.
    pub fn take_responses(&self) -> Vec<Response> {
        core::mem::take(&mut *self.responses.lock())
    }

    /// Returns the single recorded response, failing otherwise.
    pub fn only_response(&self) -> Response {
        let mut responses = self.take_responses();
        assert_eq!(responses.len(), 1, "expected one response: {responses:?}");
        responses.remove(0)
    }

    /// Returns the pushed payloads.
    pub fn pushes(&self) -> Vec<Vec<u8>> {
        self.pushes.lock().clone()
    }
}

impl Uplink for RecordingTransport {
    fn push(&self, payload: &[u8]) -> Result<(), PushError> {
        self.pushes.lock().push(payload.to_vec());
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn respond(&self, response: Response) -> Result<(), ServiceError> {
        self.responses.lock().push(response);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// A store with one resource of each access mode under `/dev`.
///
/// | Path | Mode |
/// |------|------|
/// | `/dev/temp` | Variable |
/// | `/dev/cfg/rate` | Setting |
/// | `/dev/cfg/label` | Setting |
/// | `/dev/reboot` | Command |
pub fn device_store() -> Arc<AssetStore> {
    let store = Arc::new(AssetStore::new());
    store.create("/dev/temp", AccessMode::Variable).unwrap();
    store.create("/dev/cfg/rate", AccessMode::Setting).unwrap();
    store.create("/dev/cfg/label", AccessMode::Setting).unwrap();
    store.create("/dev/reboot", AccessMode::Command).unwrap();
    store
}

/// A service over [`device_store`] and its recording transport.
pub fn device_service() -> (Arc<AssetDataService>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let service = AssetDataService::new(device_store(), transport.clone());
    (Arc::new(service), transport)
}

/// Encodes a CBOR payload with `build`.
pub fn cbor(build: impl FnOnce(&mut minicbor::Encoder<&mut Vec<u8>>)) -> Vec<u8> {
    let mut buf = Vec::new();
    build(&mut minicbor::Encoder::new(&mut buf));
    buf
}
