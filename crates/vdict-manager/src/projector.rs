//! Derived views of a binding
//!
//! The projector owns a binding's `map`, `list` and `E` views and its extra
//! fields. It recomputes them from a store snapshot at most once per store
//! version, refilling its own containers in place.

use crate::options::ExtraGetter;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;
use vdict_item::{
    map_to_keys, map_to_list, map_to_obj, DictItem, DictMap, ItemTransformer, KeyMap,
    ValueTransformer,
};

/// Projected views of one store snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictViews {
    /// Value → projected item, store order
    pub map: DictMap,
    /// Projected items, store order
    pub list: Vec<DictItem>,
    /// Value → transformed value for every stored value
    pub e: KeyMap,
}

pub(crate) struct Projector {
    views: RwLock<DictViews>,
    extra: RwLock<Map<String, Value>>,
    projected: Mutex<Option<u64>>,
    changes: watch::Sender<u64>,
    transformer: Option<ValueTransformer>,
    item_transformer: Option<ItemTransformer>,
    extras: Vec<ExtraGetter>,
}

impl Projector {
    pub(crate) fn new(
        transformer: Option<ValueTransformer>,
        item_transformer: Option<ItemTransformer>,
        extras: Vec<ExtraGetter>,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            views: RwLock::new(DictViews::default()),
            extra: RwLock::new(Map::new()),
            projected: Mutex::new(None),
            changes,
            transformer,
            item_transformer,
            extras,
        }
    }

    /// Recompute views from `snapshot` taken at `version`
    ///
    /// Returns `false` when `version` was already projected.
    pub(crate) fn project(&self, snapshot: &Arc<DictMap>, version: u64) -> bool {
        let mut projected = self.projected.lock();
        if projected.is_some_and(|last| version <= last) {
            return false;
        }
        *projected = Some(version);

        let views = {
            let mut views = self.views.write();
            map_to_obj(snapshot, &mut views.map, self.item_transformer.as_ref());
            map_to_list(snapshot, &mut views.list, self.item_transformer.as_ref());
            map_to_keys(snapshot, &mut views.e, self.transformer.as_ref());
            views.clone()
        };

        let mut extra = Map::new();
        for getter in &self.extras {
            extra.extend(getter(&views));
        }
        *self.extra.write() = extra;

        self.changes.send_replace(version);
        trace!(version, len = views.list.len(), "projected dictionary views");
        true
    }

    pub(crate) fn views(&self) -> DictViews {
        self.views.read().clone()
    }

    pub(crate) fn with_views<R>(&self, f: impl FnOnce(&DictViews) -> R) -> R {
        f(&self.views.read())
    }

    pub(crate) fn extra(&self) -> Map<String, Value> {
        self.extra.read().clone()
    }

    pub(crate) fn extra_field(&self, key: &str) -> Option<Value> {
        self.extra.read().get(key).cloned()
    }

    pub(crate) fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vdict_item::DictValue;

    fn snapshot() -> Arc<DictMap> {
        let mut map = DictMap::new();
        map.insert(DictValue::from("A"), DictItem::new("A", "Alpha"));
        map.insert(DictValue::from("B"), DictItem::new("B", "Beta"));
        Arc::new(map)
    }

    #[test]
    fn projection_is_memoized_by_version() {
        let projector = Projector::new(None, None, Vec::new());
        let snapshot = snapshot();

        assert!(projector.project(&snapshot, 1));
        let first = projector.views();
        assert!(!projector.project(&snapshot, 1));
        assert!(!projector.project(&Arc::new(DictMap::new()), 0));

        assert_eq!(projector.views(), first);
        assert_eq!(first.list.len(), 2);
        assert_eq!(first.e[&DictValue::from("B")], DictValue::from("B"));
    }

    #[test]
    fn transformers_shape_the_views() {
        let label_upper: ItemTransformer = Arc::new(|item: &DictItem| {
            let label = item.label().unwrap_or_default().to_uppercase();
            item.clone().with_label(label)
        });
        let lower: ValueTransformer = Arc::new(|value: DictValue| match value {
            DictValue::String(s) => DictValue::String(s.to_lowercase()),
            other => other,
        });
        let projector = Projector::new(Some(lower), Some(label_upper), Vec::new());
        projector.project(&snapshot(), 1);

        projector.with_views(|views| {
            assert_eq!(views.list[0].label(), Some("ALPHA"));
            assert_eq!(views.map[&DictValue::from("B")].label(), Some("BETA"));
            assert_eq!(views.e[&DictValue::from("A")], DictValue::from("a"));
        });
    }

    #[test]
    fn later_extras_override_earlier_fields() {
        let manager: ExtraGetter = Arc::new(|views: &DictViews| {
            let mut fields = Map::new();
            fields.insert("count".to_string(), Value::from(views.list.len()));
            fields.insert("source".to_string(), Value::from("manager"));
            fields
        });
        let definition: ExtraGetter = Arc::new(|_: &DictViews| {
            let mut fields = Map::new();
            fields.insert("source".to_string(), Value::from("definition"));
            fields
        });
        let projector = Projector::new(None, None, vec![manager, definition]);
        projector.project(&snapshot(), 3);

        assert_eq!(projector.extra_field("count"), Some(Value::from(2)));
        assert_eq!(projector.extra_field("source"), Some(Value::from("definition")));
        assert_eq!(*projector.changes().borrow(), 3);
    }
}
