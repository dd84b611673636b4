//! CBOR encoding of asset values.
//!
//! - [`encode_value`] / [`decode_value`] handle a single [`Value`].
//! - [`encode_subtree`] / [`decode_subtree`] convert between a sorted list of
//!   paths and a tree of nested maps, one map level per path segment.
//! - [`BoundedBuffer`] caps the size of any encoded output.

mod buffer;
mod multi;

pub use buffer::{BoundedBuffer, CapacityExceeded};
pub use multi::{DecodeReport, EntryFailure, decode_subtree, encode_subtree};

use crate::error::CodecError;
use crate::value::{MAX_STRING_BYTES, Value};
use minicbor::data::Type;
use minicbor::encode::Write;
use minicbor::{Decoder, Encoder};

/// Encodes one value.
///
/// [`Value::None`] is written as CBOR `null`.
///
/// # Errors
///
/// Propagates the writer's error.
pub fn encode_value<W: Write>(
    enc: &mut Encoder<W>,
    value: &Value,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    match value {
        Value::None => enc.null()?,
        Value::Int(v) => enc.i32(*v)?,
        Value::Float(v) => enc.f64(*v)?,
        Value::Bool(v) => enc.bool(*v)?,
        Value::String(v) => enc.str(v)?,
    };
    Ok(())
}

/// Encodes one value into a fresh buffer of at most `capacity` bytes.
///
/// # Errors
///
/// [`CodecError::BufferFull`] if the value does not fit.
pub fn encode_value_to_vec(value: &Value, capacity: usize) -> Result<Vec<u8>, CodecError> {
    let mut enc = Encoder::new(BoundedBuffer::with_capacity(capacity));
    encode_value(&mut enc, value)?;
    Ok(enc.into_writer().into_vec())
}

/// Decodes one value.
///
/// Items of any other kind than integer, float, bool, text or null are
/// skipped and reported as [`CodecError::UnsupportedType`]. Integers outside
/// `i32` and indefinite text longer than [`MAX_STRING_BYTES`] are skipped and
/// reported as [`CodecError::OutOfRange`]. Either way the decoder is left on
/// the next item.
///
/// # Errors
///
/// [`CodecError::UnsupportedType`] for unstorable items,
/// [`CodecError::OutOfRange`] for values that do not fit,
/// [`CodecError::Decode`] for malformed input.
pub fn decode_value(dec: &mut Decoder<'_>) -> Result<Value, CodecError> {
    let ty = dec.datatype()?;
    let value = match ty {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
            let n = dec.u64()?;
            Value::Int(i32::try_from(n).map_err(|_| out_of_range_int(n))?)
        }
        Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
            let n = dec.i64()?;
            Value::Int(i32::try_from(n).map_err(|_| out_of_range_int(n))?)
        }
        Type::Int => {
            dec.skip()?;
            return Err(CodecError::OutOfRange(
                "integer beyond 64 bits".to_owned(),
            ));
        }
        Type::F16 | Type::F32 | Type::F64 => Value::Float(dec.f64()?),
        Type::Bool => Value::Bool(dec.bool()?),
        Type::String => Value::String(dec.str()?.to_owned()),
        Type::StringIndef => {
            let start = dec.position();
            let mut text = String::new();
            let mut too_long = false;
            for chunk in dec.str_iter()? {
                text.push_str(chunk?);
                if text.len() > MAX_STRING_BYTES {
                    too_long = true;
                    break;
                }
            }
            if too_long {
                dec.set_position(start);
                dec.skip()?;
                return Err(CodecError::OutOfRange(format!(
                    "text longer than {MAX_STRING_BYTES} bytes"
                )));
            }
            Value::String(text)
        }
        Type::Null => {
            dec.null()?;
            Value::None
        }
        other => {
            dec.skip()?;
            return Err(CodecError::UnsupportedType(other.to_string()));
        }
    };
    Ok(value)
}

fn out_of_range_int(n: impl core::fmt::Display) -> CodecError {
    CodecError::OutOfRange(format!("{n} does not fit in i32"))
}

/// Decodes a map label, which must be a text string.
pub(crate) fn decode_label(dec: &mut Decoder<'_>) -> Result<String, CodecError> {
    match dec.datatype()? {
        Type::String => Ok(dec.str()?.to_owned()),
        other => Err(CodecError::bad_payload(format!(
            "map label must be text, found {other}"
        ))),
    }
}

/// Iteration state over a definite or indefinite CBOR map.
pub(crate) struct MapEntries {
    remaining: Option<u64>,
}

impl MapEntries {
    /// Consumes the map header.
    pub(crate) fn open(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            remaining: dec.map()?,
        })
    }

    /// Returns `true` if another key/value pair follows.
    ///
    /// For indefinite maps the terminating break is consumed.
    pub(crate) fn has_next(&mut self, dec: &mut Decoder<'_>) -> Result<bool, CodecError> {
        match &mut self.remaining {
            Some(0) => Ok(false),
            Some(n) => {
                *n -= 1;
                Ok(true)
            }
            None => {
                if dec.datatype()? == Type::Break {
                    dec.set_position(dec.position() + 1);
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Value {
        let bytes = encode_value_to_vec(value, 512).unwrap();
        decode_value(&mut Decoder::new(&bytes)).unwrap()
    }

    #[test]
    fn scalar_values_survive_encoding() {
        for value in [
            Value::Int(-7),
            Value::Int(i32::MAX),
            Value::Float(0.25),
            Value::Bool(false),
            Value::from("text"),
            Value::None,
        ] {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn out_of_range_integer_is_skipped() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .u64(u64::MAX)
            .unwrap()
            .i64(i64::MIN)
            .unwrap()
            .i32(-4)
            .unwrap();
        let mut dec = Decoder::new(&buf);

        for _ in 0..2 {
            assert!(matches!(
                decode_value(&mut dec),
                Err(CodecError::OutOfRange(_))
            ));
        }
        assert_eq!(decode_value(&mut dec).unwrap(), Value::Int(-4));
    }

    #[test]
    fn long_indefinite_text_stops_early_and_is_skipped() {
        let chunk = "x".repeat(200);
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        enc.begin_str().unwrap();
        for _ in 0..3 {
            enc.str(&chunk).unwrap();
        }
        enc.end().unwrap().bool(true).unwrap();
        let mut dec = Decoder::new(&buf);

        assert!(matches!(
            decode_value(&mut dec),
            Err(CodecError::OutOfRange(_))
        ));
        assert_eq!(decode_value(&mut dec).unwrap(), Value::Bool(true));
    }

    #[test]
    fn short_indefinite_text_is_joined() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .begin_str()
            .unwrap()
            .str("ab")
            .unwrap()
            .str("cd")
            .unwrap()
            .end()
            .unwrap();
        assert_eq!(
            decode_value(&mut Decoder::new(&buf)).unwrap(),
            Value::from("abcd")
        );
    }

    #[test]
    fn unsupported_item_is_skipped() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .array(2)
            .unwrap()
            .u8(1)
            .unwrap()
            .u8(2)
            .unwrap()
            .u8(9)
            .unwrap();
        let mut dec = Decoder::new(&buf);

        assert!(matches!(
            decode_value(&mut dec),
            Err(CodecError::UnsupportedType(_))
        ));
        assert_eq!(decode_value(&mut dec).unwrap(), Value::Int(9));
    }

    #[test]
    fn f32_decodes_as_float() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).f32(1.5).unwrap();
        assert_eq!(
            decode_value(&mut Decoder::new(&buf)).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn value_too_large_for_buffer() {
        let value = Value::from("x".repeat(64));
        assert_eq!(encode_value_to_vec(&value, 16), Err(CodecError::BufferFull));
    }
}
