//! Typed asset values.

use crate::error::StoreError;
use core::fmt;

/// Maximum length of a string value, in bytes.
pub const MAX_STRING_BYTES: usize = 255;

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No value.
    None,
    /// 32-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
}

impl DataType {
    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value held by a resource, an argument or a time-series sample.
///
/// # Example
///
/// ```
/// use avdata_store::{DataType, Value};
///
/// let v = Value::from(42);
/// assert_eq!(v.data_type(), DataType::Int);
/// assert_eq!(v.as_int(), Some(42));
/// assert_eq!(Value::default().data_type(), DataType::None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    None,
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string of at most [`MAX_STRING_BYTES`] bytes.
    String(String),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::None => DataType::None,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::String(_) => DataType::String,
        }
    }

    /// Returns `true` for [`Value::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float payload, if any.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Checks the string length bound.
    ///
    /// # Errors
    ///
    /// [`StoreError::ValueTooLong`] if a string exceeds [`MAX_STRING_BYTES`].
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Self::String(s) => check_string_len(s),
            _ => Ok(()),
        }
    }
}

/// Rejects strings longer than [`MAX_STRING_BYTES`].
pub(crate) fn check_string_len(s: &str) -> Result<(), StoreError> {
    if s.len() > MAX_STRING_BYTES {
        return Err(StoreError::ValueTooLong {
            len: s.len(),
            max: MAX_STRING_BYTES,
        });
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("(null)"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_none() {
        assert!(Value::default().is_none());
        assert_eq!(Value::default().data_type(), DataType::None);
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(7).as_str(), None);
    }

    #[test]
    fn string_bound_is_enforced() {
        let ok = Value::from("x".repeat(MAX_STRING_BYTES));
        assert!(ok.validate().is_ok());

        let too_long = Value::from("x".repeat(MAX_STRING_BYTES + 1));
        assert_eq!(
            too_long.validate(),
            Err(StoreError::ValueTooLong {
                len: MAX_STRING_BYTES + 1,
                max: MAX_STRING_BYTES
            })
        );
    }

    #[test]
    fn data_type_display() {
        assert_eq!(DataType::Float.to_string(), "float");
        assert_eq!(Value::None.to_string(), "(null)");
    }
}
