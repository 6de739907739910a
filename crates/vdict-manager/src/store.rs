//! Backing store of one dictionary
//!
//! The store is an observable cell holding an immutable snapshot of the
//! value map. Loads replace the snapshot wholesale, so readers never observe
//! a partially built map.

use std::sync::Arc;
use tokio::sync::watch;
use vdict_item::{DictItem, DictMap, DictValue};
use vdict_signal::{ObservableCell, Subscription};

/// Observable value → item map
#[derive(Debug, Default)]
pub struct DictStore {
    cell: ObservableCell<Arc<DictMap>>,
}

impl DictStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<DictMap> {
        self.cell.get()
    }

    /// Replace contents and notify subscribers
    pub fn replace(&self, map: DictMap) {
        self.cell.set(Arc::new(map));
    }

    /// Empty the store and notify subscribers
    pub fn clear(&self) {
        self.cell.set(Arc::new(DictMap::new()));
    }

    /// Item stored under `value`
    #[must_use]
    pub fn get(&self, value: &DictValue) -> Option<DictItem> {
        self.cell.with(|map| map.get(value).cloned())
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.cell.with(|map| map.len())
    }

    /// Whether the store holds no item
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Version of the contents (bumped on every replace / clear)
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Register `listener` for content changes
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<DictMap>, u64) + Send + Sync + 'static,
    ) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Version receiver for async consumers
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.cell.watch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_whole_snapshot() {
        let store = DictStore::new();
        let before = store.snapshot();

        let mut map = DictMap::new();
        map.insert(DictValue::from(1), DictItem::new(1, "one"));
        store.replace(map);

        assert!(before.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&DictValue::from(1)).unwrap().label(), Some("one"));
        assert_eq!(store.version(), 1);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.version(), 2);
    }
}
