//! Deep merge of plain records
//!
//! Objects merge key by key, recursively. Any other source value (scalars,
//! arrays) replaces what the target holds. Deep copies are plain `Clone` on
//! the owned data model.

use crate::item::DictItem;
use serde_json::{Map, Value};

/// Recursively merge `source` onto `target`
///
/// A source object merged into a non-object target slot replaces the slot
/// with a fresh object first.
pub fn deep_merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(source_obj) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(target_obj) = slot {
                    deep_merge(target_obj, source_obj);
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Merge `source` onto `target`: value (when defined) then fields
pub fn merge_item(target: &mut DictItem, source: &DictItem) {
    if !source.value.is_undefined() {
        target.value = source.value.clone();
    }
    deep_merge(&mut target.fields, &source.fields);
}

/// Shallow merge: every top-level key of `overrides` wins
#[must_use]
pub fn shallow_merge(
    base: &Map<String, Value>,
    overrides: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    #[test]
    fn nested_objects_merge() {
        let mut target = obj(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        deep_merge(&mut target, &obj(json!({"a": {"y": 3, "z": 4}})));
        assert_eq!(Value::Object(target), json!({"a": {"x": 1, "y": 3, "z": 4}, "b": 1}));
    }

    #[test]
    fn arrays_and_scalars_replace() {
        let mut target = obj(json!({"tags": [1, 2], "n": {"deep": true}}));
        deep_merge(&mut target, &obj(json!({"tags": [3], "n": 5})));
        assert_eq!(Value::Object(target), json!({"tags": [3], "n": 5}));
    }

    #[test]
    fn object_over_scalar_becomes_object() {
        let mut target = obj(json!({"meta": "flat"}));
        deep_merge(&mut target, &obj(json!({"meta": {"k": "v"}})));
        assert_eq!(Value::Object(target), json!({"meta": {"k": "v"}}));
    }

    #[test]
    fn merge_item_keeps_remote_only_fields() {
        let mut remote = DictItem::new("X", "remote").with_field("other", 2);
        let local = DictItem::new("X", "local").with_field("extra", 1);
        merge_item(&mut remote, &local);

        assert_eq!(remote.label(), Some("local"));
        assert_eq!(remote.field("other"), Some(&json!(2)));
        assert_eq!(remote.field("extra"), Some(&json!(1)));
    }

    #[test]
    fn shallow_merge_prefers_overrides() {
        let merged = shallow_merge(&obj(json!({"page": 1, "q": "a"})), &obj(json!({"page": 2})));
        assert_eq!(Value::Object(merged), json!({"page": 2, "q": "a"}));
    }
}
