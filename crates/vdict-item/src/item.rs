//! Dictionary item record
//!
//! A [`DictItem`] is one entry of a dictionary: its [`DictValue`] key plus
//! an open set of fields (`label` and anything the data source carries).

use crate::value::DictValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors building items from untyped data
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// Item source was not a JSON object
    #[error("dictionary item must be an object, got {0}")]
    NotAnObject(String),

    /// Item could not be decoded
    #[error("invalid dictionary item: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// One dictionary entry
///
/// Serializes as a single flat object: `{"value": .., "label": .., ..}`.
/// An undefined value is omitted from the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictItem {
    /// Key of the item within its dictionary
    #[serde(default, skip_serializing_if = "DictValue::is_undefined")]
    pub value: DictValue,

    /// Label and every extra field
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DictItem {
    /// Create item with value and label
    #[must_use]
    pub fn new(value: impl Into<DictValue>, label: impl Into<String>) -> Self {
        Self::default().with_value(value).with_label(label)
    }

    /// Create item carrying only a label (value left undefined)
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self::default().with_label(label)
    }

    /// Decode from a JSON object
    ///
    /// # Errors
    /// Returns error if `value` is not an object
    pub fn from_json(value: Value) -> Result<Self, ItemError> {
        if !value.is_object() {
            return Err(ItemError::NotAnObject(value.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a flat JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        if !self.value.is_undefined() {
            object.insert("value".to_string(), self.value.to_json());
        }
        object.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(object)
    }

    /// With value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<DictValue>) -> Self {
        self.value = value.into();
        self
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.fields
            .insert("label".to_string(), Value::String(label.into()));
        self
    }

    /// With extra field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Item label, if it has a string one
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.fields.get("label").and_then(Value::as_str)
    }

    /// Look up a field
    #[inline]
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_value_deserializes_as_undefined() {
        let item = DictItem::from_json(json!({"label": "Alpha"})).unwrap();
        assert!(item.value.is_undefined());
        assert_eq!(item.label(), Some("Alpha"));
    }

    #[test]
    fn explicit_null_value_is_kept() {
        let item = DictItem::from_json(json!({"value": null, "color": "red"})).unwrap();
        assert_eq!(item.value, DictValue::Null);
        assert_eq!(item.field("color"), Some(&json!("red")));
        assert!(!item.fields.contains_key("value"));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = DictItem::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ItemError::NotAnObject(_)));
    }

    #[test]
    fn to_json_is_flat() {
        let item = DictItem::new(1, "Loading").with_field("color", "red");
        assert_eq!(
            item.to_json(),
            json!({"value": 1, "label": "Loading", "color": "red"})
        );
        assert_eq!(serde_json::to_value(&item).unwrap(), item.to_json());
    }
}
