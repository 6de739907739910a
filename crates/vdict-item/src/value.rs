//! Dictionary value keys
//!
//! Provides [`DictValue`], the key an item is stored under inside a
//! dictionary. It covers the scalar subset of JSON plus an explicit
//! [`DictValue::Undefined`] for items that carried no value at all.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Key of a dictionary item
///
/// `Undefined` and `Null` are distinct: a keyed record entry with no `value`
/// field defaults to its record key, while an explicit `null` is kept.
///
/// Non-scalar JSON (arrays, objects) is keyed by its compact JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DictValue {
    /// No value present
    #[default]
    Undefined,

    /// Explicit `null`
    Null,

    /// Boolean value
    Bool(bool),

    /// Numeric value
    Number(Number),

    /// String value
    String(String),
}

impl DictValue {
    /// Whether the value is absent
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Whether the value is absent or `null`
    #[inline]
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Borrow the string payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload as `i64`
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Convert to a JSON value (`Undefined` becomes `null`)
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for DictValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            other @ (Value::Array(_) | Value::Object(_)) => Self::String(other.to_string()),
        }
    }
}

impl From<DictValue> for Value {
    fn from(value: DictValue) -> Self {
        match value {
            DictValue::Undefined | DictValue::Null => Value::Null,
            DictValue::Bool(b) => Value::Bool(b),
            DictValue::Number(n) => Value::Number(n),
            DictValue::String(s) => Value::String(s),
        }
    }
}

impl From<&str> for DictValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DictValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for DictValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for DictValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for DictValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for DictValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl fmt::Display for DictValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn undefined_and_null_are_distinct() {
        assert_ne!(DictValue::Undefined, DictValue::Null);
        assert!(DictValue::Undefined.is_nullish());
        assert!(DictValue::Null.is_nullish());
        assert!(!DictValue::from("A").is_nullish());
    }

    #[test]
    fn from_json_scalars() {
        assert_eq!(DictValue::from(json!(1)), DictValue::from(1));
        assert_eq!(DictValue::from(json!("x")), DictValue::from("x"));
        assert_eq!(DictValue::from(json!(true)), DictValue::Bool(true));
        assert_eq!(DictValue::from(json!(null)), DictValue::Null);
    }

    #[test]
    fn non_scalar_is_keyed_by_json_text() {
        let value = DictValue::from(json!([1, 2]));
        assert_eq!(value.as_str(), Some("[1,2]"));
    }

    #[test]
    fn display_renders_raw_strings() {
        assert_eq!(DictValue::from("SUCCESS").to_string(), "SUCCESS");
        assert_eq!(DictValue::from(2).to_string(), "2");
        assert_eq!(DictValue::Undefined.to_string(), "undefined");
    }

    #[test]
    fn serde_roundtrip_through_json() {
        let value: DictValue = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(value.as_i64(), Some(42));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(42));
    }
}
