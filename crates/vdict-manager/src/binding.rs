//! Consumer bindings
//!
//! A [`DictBinding`] is one consumer's live handle on a dictionary: the
//! store it reads (shared or private), its projected views, and the load
//! operations. Dropping the binding stops its projection.

use crate::fetch::FetchOptions;
use crate::instance::{LoadTicket, Loader};
use crate::projector::{DictViews, Projector};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use vdict_item::{DictItem, DictMap, DictValue, KeyMap};
use vdict_signal::Subscription;

/// Result of [`DictBinding::get_item`]
#[derive(Debug, Clone, PartialEq)]
pub enum ItemLookup {
    /// Item stored under the value
    Found(DictItem),
    /// Value not in the store
    Absent,
    /// Lookup value was missing, `null` or undefined
    NullInput,
}

impl ItemLookup {
    /// The found item, if any
    #[must_use]
    pub fn into_option(self) -> Option<DictItem> {
        match self {
            Self::Found(item) => Some(item),
            Self::Absent | Self::NullInput => None,
        }
    }

    /// Whether an item was found
    #[inline]
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Live handle on one dictionary
pub struct DictBinding {
    loader: Loader,
    projector: Arc<Projector>,
    _subscription: Subscription,
}

impl DictBinding {
    /// Subscribe the projector to the slot's store, then project the current contents
    pub(crate) fn attach(loader: Loader) -> Self {
        let definition = &loader.instance.definition;
        let projector = Arc::new(Projector::new(
            definition.transformer.clone(),
            definition.item_transformer.clone(),
            loader.instance.extras.clone(),
        ));

        let store = loader.slot.store();
        let listener = Arc::clone(&projector);
        let subscription = store.subscribe(move |snapshot, version| {
            listener.project(snapshot, version);
        });
        // Version before snapshot: a write in between re-projects through the listener.
        let version = store.version();
        projector.project(&store.snapshot(), version);

        Self {
            loader,
            projector,
            _subscription: subscription,
        }
    }

    /// Dictionary code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.loader.instance.code
    }

    /// Whether the binding owns a private store
    #[must_use]
    pub fn is_clone(&self) -> bool {
        self.loader.clone
    }

    /// Projected items in store order
    #[must_use]
    pub fn list(&self) -> Vec<DictItem> {
        self.projector.with_views(|views| views.list.clone())
    }

    /// Projected value → item map
    #[must_use]
    pub fn map(&self) -> DictMap {
        self.projector.with_views(|views| views.map.clone())
    }

    /// Value → transformed value map
    #[must_use]
    pub fn e(&self) -> KeyMap {
        self.projector.with_views(|views| views.e.clone())
    }

    /// All projected views
    #[must_use]
    pub fn views(&self) -> DictViews {
        self.projector.views()
    }

    /// Read the projected views in place
    pub fn with_views<R>(&self, f: impl FnOnce(&DictViews) -> R) -> R {
        self.projector.with_views(f)
    }

    /// Fields contributed by extra getters
    #[must_use]
    pub fn extra(&self) -> Map<String, Value> {
        self.projector.extra()
    }

    /// One extra field
    #[must_use]
    pub fn extra_field(&self, key: &str) -> Option<Value> {
        self.projector.extra_field(key)
    }

    /// Ticket of the latest load on the bound store
    #[must_use]
    pub fn load_promise(&self) -> LoadTicket {
        self.loader.slot.current_ticket()
    }

    /// Reload with the binding's base fetch options
    pub fn load(&self) -> LoadTicket {
        self.loader.load(&FetchOptions::new())
    }

    /// Reload with `options` merged over the base fetch options
    pub fn load_with(&self, options: &FetchOptions) -> LoadTicket {
        self.loader.load(options)
    }

    /// Empty the bound store
    ///
    /// Affects every binding sharing the store; a clone only clears itself.
    pub fn clear(&self) {
        self.loader.slot.store().clear();
    }

    /// Look up the stored item for `value`
    #[must_use]
    pub fn get_item(&self, value: Option<&DictValue>) -> ItemLookup {
        match value {
            None => ItemLookup::NullInput,
            Some(value) if value.is_nullish() => ItemLookup::NullInput,
            Some(value) => self
                .loader
                .slot
                .store()
                .get(value)
                .map_or(ItemLookup::Absent, ItemLookup::Found),
        }
    }

    /// Future completing at the next projection after this call
    pub fn changed(&self) -> impl Future<Output = ()> + Send + 'static {
        // Receivers start with the current version marked as seen.
        let mut changes = self.projector.changes();
        async move {
            let _ = changes.changed().await;
        }
    }

    /// Receiver of projected store versions
    #[must_use]
    pub fn watch(&self) -> tokio::sync::watch::Receiver<u64> {
        self.projector.changes()
    }
}

impl fmt::Debug for DictBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictBinding")
            .field("code", &self.code())
            .field("clone", &self.is_clone())
            .field("len", &self.projector.with_views(|views| views.list.len()))
            .finish_non_exhaustive()
    }
}
