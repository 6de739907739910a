//! Manager, definition and binding options
//!
//! Configuration follows a builder style: every struct has a `Default` and
//! `with_*` methods returning `Self`.

use crate::fetch::{DictFetcher, FetchOptions};
use crate::projector::DictViews;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use vdict_item::{DictItem, DictRecord, DictValue, ItemTransformer, ValueTransformer};

/// Computes additional binding fields from the projected views
///
/// Extra getters compose by field union: manager-level fields first, then
/// definition-level fields, later ones overriding on conflict.
///
/// Getters run synchronously on the task that committed the store write,
/// after the load bookkeeping is unlocked. They may create bindings or start
/// loads, but must not block until a load of the same store settles: the
/// next write waits for them.
pub type ExtraGetter = Arc<dyn Fn(&DictViews) -> Map<String, Value> + Send + Sync>;

/// What happens when an older load settles after a newer one committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleLoadPolicy {
    /// Every successful load commits when it settles
    #[default]
    LastSettled,

    /// A load older than the latest committed one is discarded
    LastIssued,
}

/// Code passed to the fetcher when extending an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtendCodePolicy {
    /// Always the root definition's code
    #[default]
    Root,

    /// The code of the dictionary `extend` was called on
    Parent,
}

/// Manager-wide defaults
#[derive(Clone, Default)]
pub struct ManagerOptions {
    /// Fallback fetcher for definitions without one
    pub fetch: Option<Arc<dyn DictFetcher>>,
    /// Extra fields added to every binding
    pub extra: Option<ExtraGetter>,
    /// Fallback value transformer
    pub transformer: Option<ValueTransformer>,
    /// Fallback item transformer for projections
    pub item_transformer: Option<ItemTransformer>,
    /// Stale load handling
    pub stale_loads: StaleLoadPolicy,
    /// Fetch code resolution for nested extensions
    pub extend_code: ExtendCodePolicy,
}

impl ManagerOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default fetcher
    #[inline]
    #[must_use]
    pub fn with_fetch(mut self, fetcher: impl DictFetcher + 'static) -> Self {
        self.fetch = Some(Arc::new(fetcher));
        self
    }

    /// With extra getter applied to every binding
    #[inline]
    #[must_use]
    pub fn with_extra(
        mut self,
        extra: impl Fn(&DictViews) -> Map<String, Value> + Send + Sync + 'static,
    ) -> Self {
        self.extra = Some(Arc::new(extra));
        self
    }

    /// With default value transformer
    #[inline]
    #[must_use]
    pub fn with_transformer(
        mut self,
        transformer: impl Fn(DictValue) -> DictValue + Send + Sync + 'static,
    ) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// With default item transformer
    #[inline]
    #[must_use]
    pub fn with_item_transformer(
        mut self,
        transformer: impl Fn(&DictItem) -> DictItem + Send + Sync + 'static,
    ) -> Self {
        self.item_transformer = Some(Arc::new(transformer));
        self
    }

    /// With stale load policy
    #[inline]
    #[must_use]
    pub fn with_stale_loads(mut self, policy: StaleLoadPolicy) -> Self {
        self.stale_loads = policy;
        self
    }

    /// With extension code policy
    #[inline]
    #[must_use]
    pub fn with_extend_code(mut self, policy: ExtendCodePolicy) -> Self {
        self.extend_code = policy;
        self
    }
}

impl fmt::Debug for ManagerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerOptions")
            .field("fetch", &self.fetch.is_some())
            .field("extra", &self.extra.is_some())
            .field("transformer", &self.transformer.is_some())
            .field("item_transformer", &self.item_transformer.is_some())
            .field("stale_loads", &self.stale_loads)
            .field("extend_code", &self.extend_code)
            .finish()
    }
}

/// Definition of one dictionary
///
/// Immutable once registered; the registry keeps the version with manager
/// defaults applied so extensions can derive from it.
#[derive(Clone, Default)]
pub struct DictDefinition {
    /// Static seed items, keyed by default value
    pub data: DictRecord,
    /// Whether loads call the fetcher
    pub remote: bool,
    /// Remote item source
    pub fetch: Option<Arc<dyn DictFetcher>>,
    /// Extra fields for bindings of this dictionary
    pub extra: Option<ExtraGetter>,
    /// Value transformer
    pub transformer: Option<ValueTransformer>,
    /// Item transformer for projections
    pub item_transformer: Option<ItemTransformer>,
}

impl DictDefinition {
    /// Create empty local definition
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With seed data
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: DictRecord) -> Self {
        self.data = data;
        self
    }

    /// With one seed item under `key`
    #[inline]
    #[must_use]
    pub fn with_item(mut self, key: impl Into<String>, item: DictItem) -> Self {
        self.data.insert(key.into(), item);
        self
    }

    /// Mark as remote (loads call the fetcher)
    #[inline]
    #[must_use]
    pub fn remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// With fetcher
    #[inline]
    #[must_use]
    pub fn with_fetch(mut self, fetcher: impl DictFetcher + 'static) -> Self {
        self.fetch = Some(Arc::new(fetcher));
        self
    }

    /// With shared fetcher
    #[inline]
    #[must_use]
    pub fn with_shared_fetch(mut self, fetcher: Arc<dyn DictFetcher>) -> Self {
        self.fetch = Some(fetcher);
        self
    }

    /// With extra getter
    #[inline]
    #[must_use]
    pub fn with_extra(
        mut self,
        extra: impl Fn(&DictViews) -> Map<String, Value> + Send + Sync + 'static,
    ) -> Self {
        self.extra = Some(Arc::new(extra));
        self
    }

    /// With value transformer
    #[inline]
    #[must_use]
    pub fn with_transformer(
        mut self,
        transformer: impl Fn(DictValue) -> DictValue + Send + Sync + 'static,
    ) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// With item transformer
    #[inline]
    #[must_use]
    pub fn with_item_transformer(
        mut self,
        transformer: impl Fn(&DictItem) -> DictItem + Send + Sync + 'static,
    ) -> Self {
        self.item_transformer = Some(Arc::new(transformer));
        self
    }

    /// Fill unset fetch / transformers from manager defaults
    ///
    /// `extra` is not filled: manager and definition extras compose instead.
    #[must_use]
    pub(crate) fn with_defaults(mut self, defaults: &ManagerOptions) -> Self {
        if self.fetch.is_none() {
            self.fetch.clone_from(&defaults.fetch);
        }
        if self.transformer.is_none() {
            self.transformer.clone_from(&defaults.transformer);
        }
        if self.item_transformer.is_none() {
            self.item_transformer.clone_from(&defaults.item_transformer);
        }
        self
    }
}

impl fmt::Debug for DictDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictDefinition")
            .field("data", &self.data)
            .field("remote", &self.remote)
            .field("fetch", &self.fetch.is_some())
            .field("extra", &self.extra.is_some())
            .field("transformer", &self.transformer.is_some())
            .field("item_transformer", &self.item_transformer.is_some())
            .finish()
    }
}

/// Options of one `use_dict` call
#[derive(Debug, Clone, PartialEq)]
pub struct UseDictOptions {
    /// Private store and ticket instead of the shared ones
    pub clone: bool,
    /// Load a remote dictionary right away
    pub immediate: bool,
    /// Reload after the in-flight load even if the store was loaded before
    pub refresh: bool,
    /// Base options forwarded to the fetcher
    pub fetch_options: FetchOptions,
}

impl Default for UseDictOptions {
    fn default() -> Self {
        Self {
            clone: false,
            immediate: true,
            refresh: false,
            fetch_options: FetchOptions::new(),
        }
    }
}

impl UseDictOptions {
    /// Create default options (shared, immediate, no refresh)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With clone mode
    #[inline]
    #[must_use]
    pub fn with_clone(mut self, clone: bool) -> Self {
        self.clone = clone;
        self
    }

    /// With immediate mode
    #[inline]
    #[must_use]
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// With refresh mode
    #[inline]
    #[must_use]
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// With one fetch option
    #[inline]
    #[must_use]
    pub fn with_fetch_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fetch_options.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch_sync;

    #[test]
    fn use_dict_defaults() {
        let options = UseDictOptions::new();
        assert!(!options.clone);
        assert!(options.immediate);
        assert!(!options.refresh);
        assert!(options.fetch_options.is_empty());
    }

    #[test]
    fn definition_options_win_over_defaults() {
        let defaults = ManagerOptions::new()
            .with_fetch(fetch_sync(|_, _| Ok(Vec::new())))
            .with_transformer(|value| value);
        let own = Arc::new(fetch_sync(|_, _| Ok(vec![DictItem::new("own", "own")])));
        let own_dyn: Arc<dyn DictFetcher> = own;

        let definition = DictDefinition::new()
            .with_shared_fetch(Arc::clone(&own_dyn))
            .with_defaults(&defaults);

        let fetch = definition.fetch.as_ref().unwrap();
        assert!(Arc::ptr_eq(fetch, &own_dyn));
        assert!(definition.transformer.is_some());
        assert!(definition.item_transformer.is_none());
    }

    #[test]
    fn definition_builder_collects_items() {
        let definition = DictDefinition::new()
            .with_item("A", DictItem::labeled("a"))
            .with_item("B", DictItem::labeled("b"))
            .remote(true);
        assert_eq!(definition.data.len(), 2);
        assert!(definition.remote);
    }
}
