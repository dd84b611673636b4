//! Session-owned record handles.
//!
//! Applications address records through a [`RecordRef`]. Every record
//! belongs to the client session that created it and is dropped when that
//! session closes.

use crate::config::RecordConfig;
use crate::error::TimeSeriesError;
use crate::push::Uplink;
use crate::record::TimeSeriesRecord;
use core::sync::atomic::{AtomicU64, Ordering};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Identifies a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Opaque handle to a registered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef(u64);

#[derive(Debug)]
struct Entry {
    session: SessionId,
    record: TimeSeriesRecord,
}

/// Registry of time-series records keyed by [`RecordRef`].
///
/// # Example
///
/// ```
/// use avdata_timeseries::{RecordRegistry, SessionId};
///
/// let registry = RecordRegistry::default();
/// let session = SessionId(1);
/// let rec = registry.create(session);
///
/// registry
///     .with_record(rec, |record| record.add_int("/x", 1, 10))
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(registry.close_session(session), 1);
/// assert!(registry.with_record(rec, |_| ()).is_err());
/// ```
#[derive(Debug, Default)]
pub struct RecordRegistry {
    records: Mutex<IndexMap<RecordRef, Entry>>,
    next_ref: AtomicU64,
    config: RecordConfig,
}

impl RecordRegistry {
    /// Creates a registry whose records use `config`.
    #[must_use]
    pub fn with_config(config: RecordConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates an empty record owned by `session`.
    pub fn create(&self, session: SessionId) -> RecordRef {
        let rec = RecordRef(self.next_ref.fetch_add(1, Ordering::Relaxed));
        self.records.lock().insert(
            rec,
            Entry {
                session,
                record: TimeSeriesRecord::with_config(self.config),
            },
        );
        tracing::debug!(record = ?rec, session = session.0, "record created");
        rec
    }

    /// Runs `f` on a record.
    ///
    /// The registry is locked while `f` runs, so `f` must not call back
    /// into the registry.
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::UnknownRecord`] if `rec` is not registered.
    pub fn with_record<R>(
        &self,
        rec: RecordRef,
        f: impl FnOnce(&mut TimeSeriesRecord) -> R,
    ) -> Result<R, TimeSeriesError> {
        let mut records = self.records.lock();
        let entry = records
            .get_mut(&rec)
            .ok_or(TimeSeriesError::UnknownRecord(rec))?;
        Ok(f(&mut entry.record))
    }

    /// Pushes a record through `uplink`. See [`TimeSeriesRecord::push`].
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::UnknownRecord`], or any push error.
    pub fn push(&self, rec: RecordRef, uplink: &(impl Uplink + ?Sized)) -> Result<(), TimeSeriesError> {
        self.with_record(rec, |record| record.push(uplink))?
    }

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::UnknownRecord`] if `rec` is not registered.
    pub fn delete(&self, rec: RecordRef) -> Result<(), TimeSeriesError> {
        self.records
            .lock()
            .shift_remove(&rec)
            .map(drop)
            .ok_or(TimeSeriesError::UnknownRecord(rec))
    }

    /// Removes every record owned by `session` and returns how many there were.
    pub fn close_session(&self, session: SessionId) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, entry| entry.session != session);
        let dropped = before - records.len();
        if dropped > 0 {
            tracing::debug!(session = session.0, dropped, "session records released");
        }
        dropped
    }

    /// Returns the number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if no record is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_are_unique() {
        let registry = RecordRegistry::default();
        let a = registry.create(SessionId(1));
        let b = registry.create(SessionId(1));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn delete_twice_fails() {
        let registry = RecordRegistry::default();
        let rec = registry.create(SessionId(1));
        registry.delete(rec).unwrap();
        assert_eq!(
            registry.delete(rec),
            Err(TimeSeriesError::UnknownRecord(rec))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn close_session_keeps_other_sessions() {
        let registry = RecordRegistry::default();
        registry.create(SessionId(1));
        registry.create(SessionId(1));
        let kept = registry.create(SessionId(2));

        assert_eq!(registry.close_session(SessionId(1)), 2);
        assert_eq!(registry.close_session(SessionId(1)), 0);
        assert!(registry.with_record(kept, |record| record.is_empty()).unwrap());
    }

    #[test]
    fn records_inherit_config() {
        let config = RecordConfig::default().with_buffer_bytes(128);
        let registry = RecordRegistry::with_config(config);
        let rec = registry.create(SessionId(9));
        let bytes = registry
            .with_record(rec, |record| record.config().buffer_bytes)
            .unwrap();
        assert_eq!(bytes, 128);
    }
}
