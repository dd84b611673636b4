//! Execute argument lists.
//!
//! An [`ArgumentList`] is decoded from the CBOR map the server sends with an
//! execute request and lives for the duration of that one command.
//!
//! # Example
//!
//! ```
//! use avdata_store::ArgumentList;
//!
//! // {"speed": 3, "label": "fast"}
//! let payload = [0xa2, 0x65, b's', b'p', b'e', b'e', b'd', 0x03,
//!                0x65, b'l', b'a', b'b', b'e', b'l', 0x64, b'f', b'a', b's', b't'];
//! let args = ArgumentList::from_cbor(&payload).unwrap();
//!
//! assert_eq!(args.get_int("speed").unwrap(), 3);
//! assert_eq!(args.get_string("label").unwrap(), "fast");
//! assert!(args.get_bool("speed").is_err());
//! ```

use crate::codec::{MapEntries, decode_label, decode_value};
use crate::error::{CodecError, StoreError};
use crate::value::Value;
use indexmap::IndexMap;
use minicbor::Decoder;
use minicbor::data::Type;

/// One named execute argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument<'a> {
    /// Argument name.
    pub name: &'a str,
    /// Argument value.
    pub value: &'a Value,
}

/// Ordered set of named, typed execute arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList {
    args: IndexMap<String, Value>,
}

impl ArgumentList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an argument list from a CBOR map payload.
    ///
    /// An empty payload is an empty list. When a name repeats, its first
    /// value is kept.
    ///
    /// # Errors
    ///
    /// [`CodecError::BadPayload`] if the payload is not a map, a label is not
    /// text, a value has no storable type, or bytes trail the map.
    pub fn from_cbor(payload: &[u8]) -> Result<Self, CodecError> {
        let mut list = Self::new();
        if payload.is_empty() {
            return Ok(list);
        }

        let mut dec = Decoder::new(payload);
        let ty = dec.datatype().map_err(bad_payload)?;
        if !matches!(ty, Type::Map | Type::MapIndef) {
            return Err(CodecError::bad_payload(format!(
                "argument payload must be a map, found {ty}"
            )));
        }
        let mut entries = MapEntries::open(&mut dec).map_err(into_bad_payload)?;

        while entries.has_next(&mut dec).map_err(into_bad_payload)? {
            let name = decode_label(&mut dec).map_err(into_bad_payload)?;
            let value = decode_value(&mut dec).map_err(into_bad_payload)?;
            if value.is_none() {
                return Err(CodecError::bad_payload(format!(
                    "argument {name:?} has no value"
                )));
            }
            value
                .validate()
                .map_err(|err| CodecError::bad_payload(format!("argument {name:?}: {err}")))?;
            if list.args.contains_key(&name) {
                tracing::debug!(name = %name, "ignoring repeated argument");
                continue;
            }
            list.args.insert(name, value);
        }

        if dec.position() != payload.len() {
            return Err(CodecError::bad_payload("trailing bytes after argument map"));
        }
        Ok(list)
    }

    /// Adds an argument unless the name is already present.
    ///
    /// Returns `false` if the name was taken.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.args.contains_key(&name) {
            return false;
        }
        self.args.insert(name, value.into());
        true
    }

    /// Returns the raw value of an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Returns a boolean argument.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the argument is missing or not a bool.
    pub fn get_bool(&self, name: &str) -> Result<bool, StoreError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| StoreError::not_found(name))
    }

    /// Returns an integer argument.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the argument is missing or not an int.
    pub fn get_int(&self, name: &str) -> Result<i32, StoreError> {
        self.get(name)
            .and_then(Value::as_int)
            .ok_or_else(|| StoreError::not_found(name))
    }

    /// Returns a float argument.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the argument is missing or not a float.
    pub fn get_float(&self, name: &str) -> Result<f64, StoreError> {
        self.get(name)
            .and_then(Value::as_float)
            .ok_or_else(|| StoreError::not_found(name))
    }

    /// Returns a string argument.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the argument is missing or not a string.
    pub fn get_string(&self, name: &str) -> Result<&str, StoreError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::not_found(name))
    }

    /// Returns the byte length of a string argument.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the argument is missing or not a string.
    pub fn get_string_len(&self, name: &str) -> Result<usize, StoreError> {
        self.get_string(name).map(str::len)
    }

    /// Iterates the arguments in payload order.
    pub fn iter(&self) -> impl Iterator<Item = Argument<'_>> {
        self.args
            .iter()
            .map(|(name, value)| Argument { name, value })
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

fn bad_payload(err: minicbor::decode::Error) -> CodecError {
    CodecError::bad_payload(err.to_string())
}

fn into_bad_payload(err: CodecError) -> CodecError {
    match err {
        CodecError::BadPayload(_) => err,
        other => CodecError::bad_payload(other.to_string()),
    }
}
