//! Multi-value tree encoding.
//!
//! A sorted path list such as
//!
//! ```text
//! /room/light/level   = 3
//! /room/light/on      = true
//! /room/temp          = 21.5
//! ```
//!
//! encoded from level 2 (below `/room`) becomes
//!
//! ```text
//! { "light": { "level": 3, "on": true }, "temp": 21.5 }
//! ```
//!
//! Each nested map is written with indefinite length.

use super::{BoundedBuffer, MapEntries, decode_label, decode_value, encode_value};
use crate::error::{CodecError, StoreError};
use crate::path;
use crate::value::{MAX_STRING_BYTES, Value};
use minicbor::data::Type;
use minicbor::{Decoder, Encoder};

/// Encodes `entries` as nested maps, starting at path segment `base_depth`.
///
/// `entries` must be grouped at every level; sorting them by path is
/// sufficient. Every path must have a segment at `base_depth`.
///
/// # Errors
///
/// - [`CodecError::BufferFull`] if the output would exceed `capacity` bytes
/// - [`CodecError::Fault`] if a path is shallower than `base_depth`
///
/// # Example
///
/// ```
/// use avdata_store::Value;
/// use avdata_store::codec::encode_subtree;
///
/// let entries = vec![
///     ("/a/b".to_string(), Value::Int(1)),
///     ("/a/c/d".to_string(), Value::Bool(true)),
/// ];
/// let bytes = encode_subtree(&entries, 2, 256).unwrap();
/// assert_eq!(bytes[0], 0xbf); // indefinite map
/// ```
pub fn encode_subtree(
    entries: &[(String, Value)],
    base_depth: usize,
    capacity: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut enc = Encoder::new(BoundedBuffer::with_capacity(capacity));
    encode_level(&mut enc, entries, base_depth)?;
    Ok(enc.into_writer().into_vec())
}

fn encode_level(
    enc: &mut Encoder<BoundedBuffer>,
    entries: &[(String, Value)],
    level: usize,
) -> Result<(), CodecError> {
    enc.begin_map()?;

    let mut rest = entries;
    while let Some((first_path, first_value)) = rest.first() {
        let token = path::segment(first_path, level).ok_or_else(|| {
            CodecError::fault(format!("{first_path} has no segment at level {level}"))
        })?;

        if path::segment(first_path, level + 1).is_none() {
            enc.str(token)?;
            encode_value(enc, first_value)?;
            rest = &rest[1..];
            continue;
        }

        // Branch: fold the run of paths sharing this token into one sub-map.
        let run = rest
            .iter()
            .take_while(|(p, _)| {
                path::segment(p, level) == Some(token) && path::segment(p, level + 1).is_some()
            })
            .count();
        enc.str(token)?;
        encode_level(enc, &rest[..run], level + 1)?;
        rest = &rest[run..];
    }

    enc.end()?;
    Ok(())
}

/// A single entry that could not be applied during [`decode_subtree`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFailure {
    /// Full path of the entry.
    pub path: String,
    /// Why it was rejected.
    pub error: StoreError,
}

/// Outcome of a [`decode_subtree`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
    /// Number of entries handed successfully to the sink.
    pub applied: usize,
    /// Entries that were rejected.
    pub failures: Vec<EntryFailure>,
}

impl DecodeReport {
    /// Returns `true` if every entry was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: String, error: StoreError) {
        tracing::error!(path = %path, error = %error, "failed to apply multi-value entry");
        self.failures.push(EntryFailure { path, error });
    }
}

/// Decodes a map of nested maps, handing each leaf to `sink` under its full
/// path (`base_path` followed by the labels leading to it).
///
/// A leaf that cannot be applied is recorded in the returned report and
/// decoding continues with its siblings.
///
/// # Errors
///
/// Malformed input (not a map, a non-text label, truncated data) aborts with
/// [`CodecError::BadPayload`] or [`CodecError::Decode`]. Entries applied
/// before the error stay applied.
pub fn decode_subtree<F>(
    dec: &mut Decoder<'_>,
    base_path: &str,
    sink: &mut F,
) -> Result<DecodeReport, CodecError>
where
    F: FnMut(&str, Value) -> Result<(), StoreError>,
{
    let mut stack = SegmentStack::new(base_path);
    let mut report = DecodeReport::default();
    decode_level(dec, &mut stack, sink, &mut report)?;
    Ok(report)
}

fn decode_level<F>(
    dec: &mut Decoder<'_>,
    stack: &mut SegmentStack,
    sink: &mut F,
    report: &mut DecodeReport,
) -> Result<(), CodecError>
where
    F: FnMut(&str, Value) -> Result<(), StoreError>,
{
    let ty = dec.datatype()?;
    if !matches!(ty, Type::Map | Type::MapIndef) {
        return Err(CodecError::bad_payload(format!("expected a map, found {ty}")));
    }

    let mut entries = MapEntries::open(dec)?;
    while entries.has_next(dec)? {
        let label = decode_label(dec)?;
        stack.push(label);
        let result = decode_entry(dec, stack, sink, report);
        stack.pop();
        result?;
    }
    Ok(())
}

fn decode_entry<F>(
    dec: &mut Decoder<'_>,
    stack: &mut SegmentStack,
    sink: &mut F,
    report: &mut DecodeReport,
) -> Result<(), CodecError>
where
    F: FnMut(&str, Value) -> Result<(), StoreError>,
{
    if stack.last_len() > MAX_STRING_BYTES {
        dec.skip()?;
        report.fail(
            stack.path(),
            StoreError::invalid_path(stack.path(), "label too long"),
        );
        return Ok(());
    }

    if matches!(dec.datatype()?, Type::Map | Type::MapIndef) {
        return decode_level(dec, stack, sink, report);
    }

    let path = stack.path();
    match decode_value(dec) {
        Ok(Value::None) => report.fail(
            path,
            CodecError::UnsupportedType("null".to_owned()).into(),
        ),
        Ok(value) => match sink(&path, value) {
            Ok(()) => report.applied += 1,
            Err(err) => report.fail(path, err),
        },
        Err(err @ (CodecError::UnsupportedType(_) | CodecError::OutOfRange(_))) => {
            report.fail(path, err.into());
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

/// Owned stack of path segments below a base path.
struct SegmentStack {
    base: String,
    segments: Vec<String>,
}

impl SegmentStack {
    fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
            segments: Vec::new(),
        }
    }

    fn push(&mut self, segment: String) {
        self.segments.push(segment);
    }

    fn pop(&mut self) {
        self.segments.pop();
    }

    fn last_len(&self) -> usize {
        self.segments.last().map_or(0, String::len)
    }

    fn path(&self) -> String {
        let mut path = self.base.clone();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}
