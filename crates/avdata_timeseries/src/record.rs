//! Time-series records.
//!
//! A record collects samples of named resources at `u64` timestamps and keeps
//! an up-to-date CBOR encoding of them that never exceeds its buffer size.
//!
//! # Wire layout
//!
//! ```text
//! {
//!   "h": [name, ...],                       // insertion order
//!   "f": [ts_factor, factor, ...],          // one per name
//!   "s": [ts, v, ..., dts, v, ..., ...]     // one row per timestamp
//! }
//! ```
//!
//! The first row starts with `ts * ts_factor`, later rows with the scaled
//! difference to the previous timestamp. A resource without a sample at a
//! timestamp contributes its type's zero value.
//!
//! # Lifecycle
//!
//! | State | Meaning |
//! |-------|---------|
//! | Empty | no samples, nothing encoded |
//! | Accumulating | samples present, encoding cached |
//! | Pushed | delivered and reset to Empty |

use crate::config::RecordConfig;
use crate::error::TimeSeriesError;
use crate::push::{Uplink, compress};
use avdata_store::codec::BoundedBuffer;
use avdata_store::{CodecError, DataType, Value};
use hashbrown::HashMap;
use indexmap::IndexMap;
use minicbor::Encoder;
use std::collections::BTreeSet;

/// Samples of one resource.
#[derive(Debug, Clone, PartialEq)]
struct Accumulator {
    data_type: DataType,
    factor: f64,
    samples: HashMap<u64, Value>,
}

impl Accumulator {
    fn new(data_type: DataType) -> Self {
        let factor = match data_type {
            DataType::Int | DataType::Float => 1.0,
            DataType::Bool | DataType::String | DataType::None => 0.0,
        };
        Self {
            data_type,
            factor,
            samples: HashMap::new(),
        }
    }

    fn encode_at(
        &self,
        enc: &mut Encoder<BoundedBuffer>,
        timestamp: u64,
    ) -> Result<(), CodecError> {
        match self.samples.get(&timestamp) {
            Some(Value::Int(v)) => {
                let scaled = f64::from(*v) * self.factor;
                if !scaled.is_finite() || scaled < I64_MIN || scaled >= I64_END {
                    return Err(CodecError::fault(format!(
                        "sample {v} scaled by {} leaves the i64 range",
                        self.factor
                    )));
                }
                enc.i64(scaled as i64)?
            }
            Some(Value::Float(v)) => {
                let scaled = v * self.factor;
                if v.is_finite() && !scaled.is_finite() {
                    return Err(CodecError::fault(format!(
                        "sample {v} scaled by {} overflows",
                        self.factor
                    )));
                }
                enc.f64(scaled)?
            }
            Some(Value::Bool(v)) => enc.bool(*v)?,
            Some(Value::String(v)) => enc.str(v)?,
            Some(Value::None) | None => match self.data_type {
                DataType::Int => enc.i64(0)?,
                DataType::Float => enc.f64(0.0)?,
                DataType::Bool => enc.bool(false)?,
                DataType::String => enc.str("")?,
                DataType::None => enc.null()?,
            },
        };
        Ok(())
    }
}

/// A batch of timestamped resource samples.
///
/// # Example
///
/// ```
/// use avdata_timeseries::TimeSeriesRecord;
///
/// let mut record = TimeSeriesRecord::new();
/// record.add_int("/x", 10, 100).unwrap();
/// record.add_int("/x", 15, 200).unwrap();
/// assert!(record.add_float("/x", 1.0, 300).is_err());
///
/// assert_eq!(record.timestamps().collect::<Vec<_>>(), [100, 200]);
/// assert!(record.encoded_len().unwrap() > 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    timestamps: BTreeSet<u64>,
    resources: IndexMap<String, Accumulator>,
    timestamp_factor: f64,
    encoded: Option<Vec<u8>>,
    config: RecordConfig,
}

impl Default for TimeSeriesRecord {
    fn default() -> Self {
        Self::with_config(RecordConfig::default())
    }
}

impl TimeSeriesRecord {
    /// Creates an empty record with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with `config`.
    #[must_use]
    pub fn with_config(config: RecordConfig) -> Self {
        Self {
            timestamps: BTreeSet::new(),
            resources: IndexMap::new(),
            timestamp_factor: 1.0,
            encoded: None,
            config,
        }
    }

    /// Returns the record configuration.
    #[must_use]
    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Adds one sample, replacing any sample of `name` at `timestamp`.
    ///
    /// The first sample of a resource fixes its type. The record is
    /// re-encoded before returning; if that fails, the sample is withdrawn
    /// and the record is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`TimeSeriesError::UnsupportedValue`] for [`Value::None`]
    /// - [`TimeSeriesError::InvalidValue`] for a string longer than
    ///   [`MAX_STRING_BYTES`](avdata_store::MAX_STRING_BYTES)
    /// - [`TimeSeriesError::TypeMismatch`] if the type differs from earlier
    ///   samples
    /// - [`TimeSeriesError::BufferFull`] if the encoding would not fit
    /// - [`TimeSeriesError::Fault`] if a scaled value leaves its wire range
    pub fn add(&mut self, name: &str, value: Value, timestamp: u64) -> Result<(), TimeSeriesError> {
        let actual = value.data_type();
        if actual == DataType::None {
            return Err(TimeSeriesError::UnsupportedValue(name.to_owned()));
        }
        value
            .validate()
            .map_err(|source| TimeSeriesError::InvalidValue {
                name: name.to_owned(),
                source,
            })?;
        if let Some(existing) = self.resources.get(name)
            && existing.data_type != actual
        {
            tracing::warn!(name, expected = %existing.data_type, %actual, "sample type mismatch");
            return Err(TimeSeriesError::TypeMismatch {
                name: name.to_owned(),
                expected: existing.data_type,
                actual,
            });
        }

        let new_timestamp = self.timestamps.insert(timestamp);
        let new_resource = !self.resources.contains_key(name);
        let previous = self
            .resources
            .entry(name.to_owned())
            .or_insert_with(|| Accumulator::new(actual))
            .samples
            .insert(timestamp, value);

        if let Err(err) = self.reencode() {
            tracing::debug!(name, timestamp, error = %err, "sample rolled back");
            if new_resource {
                self.resources.shift_remove(name);
            } else if let Some(acc) = self.resources.get_mut(name) {
                match previous {
                    Some(old) => {
                        acc.samples.insert(timestamp, old);
                    }
                    None => {
                        acc.samples.remove(&timestamp);
                    }
                }
            }
            if new_timestamp {
                self.timestamps.remove(&timestamp);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Adds an integer sample. See [`Self::add`].
    ///
    /// # Errors
    ///
    /// As [`Self::add`].
    pub fn add_int(&mut self, name: &str, value: i32, timestamp: u64) -> Result<(), TimeSeriesError> {
        self.add(name, Value::Int(value), timestamp)
    }

    /// Adds a float sample. See [`Self::add`].
    ///
    /// # Errors
    ///
    /// As [`Self::add`].
    pub fn add_float(&mut self, name: &str, value: f64, timestamp: u64) -> Result<(), TimeSeriesError> {
        self.add(name, Value::Float(value), timestamp)
    }

    /// Adds a boolean sample. See [`Self::add`].
    ///
    /// # Errors
    ///
    /// As [`Self::add`].
    pub fn add_bool(&mut self, name: &str, value: bool, timestamp: u64) -> Result<(), TimeSeriesError> {
        self.add(name, Value::Bool(value), timestamp)
    }

    /// Adds a string sample. See [`Self::add`].
    ///
    /// # Errors
    ///
    /// As [`Self::add`].
    pub fn add_string(&mut self, name: &str, value: &str, timestamp: u64) -> Result<(), TimeSeriesError> {
        self.add(name, Value::from(value), timestamp)
    }

    /// Sets the factor applied to timestamps.
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::Fault`] for a negative or non-finite factor,
    /// [`TimeSeriesError::BufferFull`] if the re-encoding would not fit (the
    /// previous factor is kept).
    pub fn set_timestamp_factor(&mut self, factor: f64) -> Result<(), TimeSeriesError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(TimeSeriesError::fault(format!(
                "invalid timestamp factor {factor}"
            )));
        }
        let previous = core::mem::replace(&mut self.timestamp_factor, factor);
        if let Err(err) = self.reencode() {
            self.timestamp_factor = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Returns the timestamp factor.
    #[must_use]
    pub fn timestamp_factor(&self) -> f64 {
        self.timestamp_factor
    }

    /// Returns the encoded record, encoding it first if needed.
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::BufferFull`] if the encoding does not fit.
    pub fn encode(&mut self) -> Result<&[u8], TimeSeriesError> {
        if self.encoded.is_none() {
            self.reencode()?;
        }
        self.encoded
            .as_deref()
            .ok_or_else(|| TimeSeriesError::fault("encoding missing after encode"))
    }

    /// Returns the size of the encoded record.
    ///
    /// # Errors
    ///
    /// As [`Self::encode`].
    pub fn encoded_len(&mut self) -> Result<usize, TimeSeriesError> {
        self.encode().map(<[u8]>::len)
    }

    /// Returns `true` if a cached encoding is available.
    #[must_use]
    pub fn is_encoded(&self) -> bool {
        self.encoded.is_some()
    }

    /// Compresses the record, hands it to `uplink` and resets the record.
    ///
    /// On failure the record is left unchanged so the push can be retried.
    ///
    /// # Errors
    ///
    /// [`TimeSeriesError::Push`] if the uplink refuses the payload, or
    /// [`TimeSeriesError::Fault`] if compression fails.
    pub fn push(&mut self, uplink: &(impl Uplink + ?Sized)) -> Result<(), TimeSeriesError> {
        let level = self.config.compression_level;
        let limit = self.config.buffer_bytes;
        let encoded = self.encode()?;
        let raw_len = encoded.len();
        let compressed = compress(encoded, level, limit)?;

        if let Err(err) = uplink.push(&compressed) {
            tracing::error!(error = %err, "time-series push failed");
            return Err(err.into());
        }
        tracing::debug!(
            raw = raw_len,
            compressed = compressed.len(),
            samples = self.sample_count(),
            "time-series record pushed"
        );
        self.reset();
        Ok(())
    }

    /// Drops every sample and restores the timestamp factor to 1.
    pub fn reset(&mut self) {
        self.timestamps.clear();
        self.resources.clear();
        self.timestamp_factor = 1.0;
        self.encoded = None;
    }

    /// Iterates the timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.timestamps.iter().copied()
    }

    /// Iterates the resource names in insertion order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Returns the fixed type of a resource.
    #[must_use]
    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.resources.get(name).map(|acc| acc.data_type)
    }

    /// Returns the sample of `name` at `timestamp`.
    #[must_use]
    pub fn sample(&self, name: &str, timestamp: u64) -> Option<&Value> {
        self.resources.get(name)?.samples.get(&timestamp)
    }

    /// Returns the number of stored samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.resources.values().map(|acc| acc.samples.len()).sum()
    }

    /// Returns `true` if the record holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn reencode(&mut self) -> Result<(), TimeSeriesError> {
        let bytes = self.encode_bounded()?;
        self.encoded = Some(bytes);
        Ok(())
    }

    fn encode_bounded(&self) -> Result<Vec<u8>, CodecError> {
        let mut enc = Encoder::new(BoundedBuffer::with_capacity(self.config.buffer_bytes));
        let columns = self.resources.len() as u64;
        let rows = self.timestamps.len() as u64;

        enc.map(3)?;

        enc.str("h")?.array(columns)?;
        for name in self.resources.keys() {
            enc.str(name)?;
        }

        enc.str("f")?.array(columns + 1)?.f64(self.timestamp_factor)?;
        for acc in self.resources.values() {
            enc.f64(acc.factor)?;
        }

        enc.str("s")?.array((columns + 1) * rows)?;
        let mut previous = None;
        for &timestamp in &self.timestamps {
            let delta = previous.map_or(timestamp, |prev| timestamp - prev);
            enc.u64(scale(delta, self.timestamp_factor)?)?;
            for acc in self.resources.values() {
                acc.encode_at(&mut enc, timestamp)?;
            }
            previous = Some(timestamp);
        }

        Ok(enc.into_writer().into_vec())
    }
}

/// `i64::MIN` and `i64::MAX + 1` as floats; both are exact powers of two.
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;
const I64_END: f64 = 9_223_372_036_854_775_808.0;
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Scales a timestamp delta, truncating toward zero.
fn scale(delta: u64, factor: f64) -> Result<u64, CodecError> {
    if factor == 1.0 {
        return Ok(delta);
    }
    let scaled = delta as f64 * factor;
    if !scaled.is_finite() || scaled >= U64_END {
        return Err(CodecError::fault(format!(
            "timestamp delta {delta} scaled by {factor} leaves the u64 range"
        )));
    }
    Ok(scaled as u64)
}
