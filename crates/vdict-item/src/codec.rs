//! Value-map codec
//!
//! Converts keyed records or item lists into a canonical [`DictMap`] keyed
//! by each item's value, and projects a map back into plain views.
//!
//! # Rules
//!
//! - Record form: an item without a value takes its record key as value
//! - List form: an item without a value stays [`DictValue::Undefined`]
//! - The value transformer runs after defaulting
//! - An item is kept iff it passes the pick list (when non-empty) and is
//!   not in the omit list
//! - Building into a target clears it first; insertion follows source order

use crate::item::DictItem;
use crate::value::DictValue;
use indexmap::IndexMap;
use std::sync::Arc;

/// Canonical store contents: value → item, insertion ordered
pub type DictMap = IndexMap<DictValue, DictItem>;

/// Value → value identity map over store keys
pub type KeyMap = IndexMap<DictValue, DictValue>;

/// Keyed record of partial items, as written in static seed data
pub type DictRecord = IndexMap<String, DictItem>;

/// Remaps item values (e.g. string codes to numbers)
pub type ValueTransformer = Arc<dyn Fn(DictValue) -> DictValue + Send + Sync>;

/// Maps an item to the shape handed out by projections
pub type ItemTransformer = Arc<dyn Fn(&DictItem) -> DictItem + Send + Sync>;

/// Source of items for [`to_map`]
#[derive(Debug, Clone, PartialEq)]
pub enum DictSource {
    /// Keyed record; keys default missing values
    Record(DictRecord),

    /// Plain list of items
    List(Vec<DictItem>),
}

impl From<DictRecord> for DictSource {
    fn from(record: DictRecord) -> Self {
        Self::Record(record)
    }
}

impl From<Vec<DictItem>> for DictSource {
    fn from(list: Vec<DictItem>) -> Self {
        Self::List(list)
    }
}

/// Pick / omit value filter
///
/// Both lists apply together: omit wins when a value is in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueFilter {
    /// Keep only these values (empty keeps everything)
    pub pick_values: Vec<DictValue>,
    /// Drop these values
    pub omit_values: Vec<DictValue>,
}

impl ValueFilter {
    /// Filter accepting every value
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With pick list
    #[inline]
    #[must_use]
    pub fn pick<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DictValue>,
    {
        self.pick_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// With omit list
    #[inline]
    #[must_use]
    pub fn omit<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DictValue>,
    {
        self.omit_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `value` passes the filter
    #[must_use]
    pub fn accepts(&self, value: &DictValue) -> bool {
        (self.pick_values.is_empty() || self.pick_values.contains(value))
            && !self.omit_values.contains(value)
    }

    /// Whether the filter keeps everything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pick_values.is_empty() && self.omit_values.is_empty()
    }
}

/// Build a fresh map from `source`
#[must_use]
pub fn to_map(
    source: impl Into<DictSource>,
    filter: &ValueFilter,
    transformer: Option<&ValueTransformer>,
) -> DictMap {
    let mut map = DictMap::new();
    to_map_into(source, &mut map, filter, transformer);
    map
}

/// Rebuild `target` from `source`, discarding its previous contents
pub fn to_map_into(
    source: impl Into<DictSource>,
    target: &mut DictMap,
    filter: &ValueFilter,
    transformer: Option<&ValueTransformer>,
) {
    target.clear();
    match source.into() {
        DictSource::Record(record) => {
            for (key, item) in record {
                insert_item(target, Some(key), item, filter, transformer);
            }
        }
        DictSource::List(list) => {
            for item in list {
                insert_item(target, None, item, filter, transformer);
            }
        }
    }
}

fn insert_item(
    target: &mut DictMap,
    key: Option<String>,
    mut item: DictItem,
    filter: &ValueFilter,
    transformer: Option<&ValueTransformer>,
) {
    if item.value.is_undefined() {
        if let Some(key) = key {
            item.value = DictValue::String(key);
        }
    }
    if let Some(transform) = transformer {
        item.value = transform(std::mem::take(&mut item.value));
    }
    if filter.accepts(&item.value) {
        target.insert(item.value.clone(), item);
    }
}

/// Project `map` into a keyed object, clearing `target` first
pub fn map_to_obj(map: &DictMap, target: &mut DictMap, item_transformer: Option<&ItemTransformer>) {
    target.clear();
    target.extend(
        map.iter()
            .map(|(key, item)| (key.clone(), project_item(item, item_transformer))),
    );
}

/// Project `map` into an item list, clearing `target` first
pub fn map_to_list(
    map: &DictMap,
    target: &mut Vec<DictItem>,
    item_transformer: Option<&ItemTransformer>,
) {
    target.clear();
    target.extend(map.values().map(|item| project_item(item, item_transformer)));
}

/// Project `map` keys into a value → value map, clearing `target` first
pub fn map_to_keys(map: &DictMap, target: &mut KeyMap, transformer: Option<&ValueTransformer>) {
    target.clear();
    target.extend(map.keys().map(|key| {
        let mapped = transformer.map_or_else(|| key.clone(), |transform| transform(key.clone()));
        (key.clone(), mapped)
    }));
}

fn project_item(item: &DictItem, item_transformer: Option<&ItemTransformer>) -> DictItem {
    match item_transformer {
        Some(transform) => transform(item),
        None => item.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(entries: &[(&str, DictItem)]) -> DictRecord {
        entries
            .iter()
            .map(|(k, item)| ((*k).to_string(), item.clone()))
            .collect()
    }

    #[test]
    fn record_key_defaults_missing_value() {
        let map = to_map(
            record(&[("A", DictItem::labeled("Alpha"))]),
            &ValueFilter::new(),
            None,
        );
        assert_eq!(map.len(), 1);
        let item = &map[&DictValue::from("A")];
        assert_eq!(item.value, DictValue::from("A"));
        assert_eq!(item.label(), Some("Alpha"));
    }

    #[test]
    fn explicit_value_wins_over_key() {
        let map = to_map(
            record(&[("LOADING", DictItem::default().with_value(1))]),
            &ValueFilter::new(),
            None,
        );
        assert!(map.contains_key(&DictValue::from(1)));
        assert!(!map.contains_key(&DictValue::from("LOADING")));
    }

    #[test]
    fn pick_and_omit_intersect() {
        let data = record(&[("A", DictItem::labeled("a")), ("B", DictItem::labeled("b"))]);
        let filter = ValueFilter::new().pick(["A"]).omit(["A"]);
        assert!(to_map(data, &filter, None).is_empty());
    }

    #[test]
    fn pick_keeps_only_listed_values() {
        let data = record(&[
            ("A", DictItem::labeled("a")),
            ("B", DictItem::labeled("b")),
            ("C", DictItem::labeled("c")),
        ]);
        let map = to_map(data, &ValueFilter::new().pick(["C", "A"]), None);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![DictValue::from("A"), DictValue::from("C")]);
    }

    #[test]
    fn transformer_applies_after_defaulting() {
        let to_number: ValueTransformer = Arc::new(|value: DictValue| match value.as_str() {
            Some(s) => s.parse::<i64>().map_or(value.clone(), DictValue::from),
            None => value,
        });
        let map = to_map(
            record(&[("1", DictItem::labeled("one"))]),
            &ValueFilter::new(),
            Some(&to_number),
        );
        assert_eq!(map[&DictValue::from(1)].value, DictValue::from(1));
    }

    #[test]
    fn list_items_without_value_collapse() {
        let list = vec![DictItem::labeled("first"), DictItem::labeled("second")];
        let map = to_map(list, &ValueFilter::new(), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&DictValue::Undefined].label(), Some("second"));
    }

    #[test]
    fn later_duplicate_overwrites_in_place() {
        let list = vec![
            DictItem::new("A", "first"),
            DictItem::new("B", "b"),
            DictItem::new("A", "again"),
        ];
        let map = to_map(list, &ValueFilter::new(), None);
        let labels: Vec<_> = map.values().filter_map(DictItem::label).collect();
        assert_eq!(labels, vec!["again", "b"]);
    }

    #[test]
    fn to_map_into_clears_target() {
        let mut target = to_map(vec![DictItem::new("OLD", "old")], &ValueFilter::new(), None);
        to_map_into(vec![DictItem::new("NEW", "new")], &mut target, &ValueFilter::new(), None);
        assert_eq!(target.len(), 1);
        assert!(target.contains_key(&DictValue::from("NEW")));
    }

    #[test]
    fn projections_follow_store_order_and_leave_store_untouched() {
        let map = to_map(
            vec![DictItem::new("B", "b"), DictItem::new("A", "a")],
            &ValueFilter::new(),
            None,
        );
        let before = map.clone();
        let upper: ItemTransformer = Arc::new(|item: &DictItem| {
            let label = item.label().unwrap_or_default().to_uppercase();
            item.clone().with_label(label)
        });

        let mut list = vec![DictItem::new("stale", "stale")];
        map_to_list(&map, &mut list, Some(&upper));
        let labels: Vec<_> = list.iter().filter_map(DictItem::label).collect();
        assert_eq!(labels, vec!["B", "A"]);

        let mut obj = DictMap::new();
        map_to_obj(&map, &mut obj, None);
        assert_eq!(obj, map);
        assert_eq!(map, before);
    }

    #[test]
    fn key_map_applies_transformer() {
        let map = to_map(vec![DictItem::new("a", "a")], &ValueFilter::new(), None);
        let upper: ValueTransformer =
            Arc::new(|value: DictValue| DictValue::from(value.to_string().to_uppercase()));

        let mut keys = KeyMap::new();
        map_to_keys(&map, &mut keys, None);
        assert_eq!(keys[&DictValue::from("a")], DictValue::from("a"));

        map_to_keys(&map, &mut keys, Some(&upper));
        assert_eq!(keys[&DictValue::from("a")], DictValue::from("A"));
    }

    #[test]
    fn remote_list_keeps_extra_fields() {
        let item =
            DictItem::from_json(json!({"value": "X", "label": "remote", "other": 2})).unwrap();
        let map = to_map(vec![item], &ValueFilter::new(), None);
        assert_eq!(map[&DictValue::from("X")].field("other"), Some(&json!(2)));
    }
}
