//! Dictionary registry
//!
//! [`DictManager`] owns the stores and resolved definitions of every code.
//! It is an explicit value: tests and applications create as many isolated
//! registries as they need.
//!
//! # Binding creation
//!
//! | Binding | Remote, not immediate | Otherwise |
//! |---------|-----------------------|-----------|
//! | clone | resolved private ticket, no load | private load |
//! | shared | resolved ticket installed if none | first binding loads, others wait on the ticket |
//!
//! A shared binding that finds an existing ticket loads after it settles
//! only if no load was claimed for the store (or the first one failed) or it
//! asked for a refresh. When the ticket is already settled that load starts
//! before `use_dict` returns.

use crate::binding::DictBinding;
use crate::error::DictError;
use crate::fetch::FetchOptions;
use crate::instance::{Claim, DictInstance, LoadSlot, Loader};
use crate::options::{DictDefinition, ExtendCodePolicy, ManagerOptions, UseDictOptions};
use crate::store::DictStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use vdict_item::{DictMap, ValueFilter};

struct ManagerInner {
    options: ManagerOptions,
    stores: DashMap<String, Arc<DictStore>>,
    definitions: DashMap<String, DictDefinition>,
    instances: DashMap<String, Arc<DictInstance>>,
}

/// Registry of dictionaries
#[derive(Clone)]
pub struct DictManager {
    inner: Arc<ManagerInner>,
}

impl Default for DictManager {
    fn default() -> Self {
        Self::new(ManagerOptions::default())
    }
}

impl DictManager {
    /// Create registry with manager-wide defaults
    #[must_use]
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                options,
                stores: DashMap::new(),
                definitions: DashMap::new(),
                instances: DashMap::new(),
            }),
        }
    }

    /// Manager-wide defaults
    #[must_use]
    pub fn options(&self) -> &ManagerOptions {
        &self.inner.options
    }

    /// Register `definition` under `code`
    ///
    /// Re-registering a code logs a warning and keeps its store.
    pub fn define(&self, code: impl Into<String>, definition: DictDefinition) -> DictHandle {
        let code = code.into();
        let origin = code.clone();
        self.define_scoped(code, definition, ValueFilter::new(), origin)
    }

    /// Register the definition built by `factory`, run once now
    pub fn define_with(
        &self,
        code: impl Into<String>,
        factory: impl FnOnce() -> DictDefinition,
    ) -> DictHandle {
        self.define(code, factory())
    }

    pub(crate) fn define_scoped(
        &self,
        code: String,
        definition: DictDefinition,
        filter: ValueFilter,
        fetch_code: String,
    ) -> DictHandle {
        let store = match self.inner.stores.entry(code.clone()) {
            Entry::Occupied(existing) => {
                warn!(code = %code, "dictionary code already exists");
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => Arc::clone(slot.insert(Arc::new(DictStore::new())).value()),
        };

        let options = &self.inner.options;
        let definition = definition.with_defaults(options);
        let extras = options
            .extra
            .iter()
            .chain(definition.extra.iter())
            .cloned()
            .collect();

        let instance = Arc::new(DictInstance {
            code: code.clone(),
            fetch_code,
            definition: definition.clone(),
            filter,
            extras,
            stale_loads: options.stale_loads,
            shared: Arc::new(LoadSlot::new(store)),
        });
        self.inner.definitions.insert(code.clone(), definition);
        self.inner.instances.insert(code.clone(), Arc::clone(&instance));
        debug!(code = %code, fetch_code = %instance.fetch_code, "dictionary defined");

        DictHandle {
            manager: self.clone(),
            instance,
        }
    }

    /// Empty the store of `code`, or every store when `None`
    ///
    /// Definitions and registry entries are kept.
    pub fn clear(&self, code: Option<&str>) {
        let stores: Vec<Arc<DictStore>> = match code {
            Some(code) => self
                .inner
                .stores
                .get(code)
                .map(|store| Arc::clone(store.value()))
                .into_iter()
                .collect(),
            None => self
                .inner
                .stores
                .iter()
                .map(|entry| Arc::clone(entry.value()))
                .collect(),
        };
        // Notify outside the map shards.
        for store in stores {
            store.clear();
        }
    }

    /// Registered codes, sorted
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .inner
            .stores
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        codes.sort();
        codes
    }

    /// Current store contents of `code`
    #[must_use]
    pub fn snapshot(&self, code: &str) -> Option<Arc<DictMap>> {
        self.inner.stores.get(code).map(|store| store.snapshot())
    }

    /// Resolved definition of `code` (manager defaults applied)
    #[must_use]
    pub fn definition(&self, code: &str) -> Option<DictDefinition> {
        self.inner
            .definitions
            .get(code)
            .map(|definition| definition.value().clone())
    }

    /// Handle of a registered code
    ///
    /// # Errors
    /// [`DictError::UnknownCode`] if `code` was never defined.
    pub fn handle(&self, code: &str) -> Result<DictHandle, DictError> {
        let instance = self
            .inner
            .instances
            .get(code)
            .map(|instance| Arc::clone(instance.value()))
            .ok_or_else(|| DictError::UnknownCode(code.to_string()))?;
        Ok(DictHandle {
            manager: self.clone(),
            instance,
        })
    }
}

impl std::fmt::Debug for DictManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictManager")
            .field("options", &self.inner.options)
            .field("codes", &self.codes())
            .finish()
    }
}

/// Use function of one registered code
#[derive(Clone)]
pub struct DictHandle {
    manager: DictManager,
    instance: Arc<DictInstance>,
}

impl DictHandle {
    /// Registered code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.instance.code
    }

    /// Code passed to the fetcher
    #[must_use]
    pub fn fetch_code(&self) -> &str {
        &self.instance.fetch_code
    }

    /// Create a binding
    ///
    /// # Errors
    /// [`DictError::NoRuntime`] when called outside a tokio runtime.
    pub fn use_dict(&self, options: UseDictOptions) -> Result<DictBinding, DictError> {
        let runtime =
            Handle::try_current().map_err(|_| DictError::NoRuntime(self.instance.code.clone()))?;
        let eager = !self.instance.definition.remote || options.immediate;

        let slot = if options.clone {
            Arc::new(LoadSlot::new(Arc::new(DictStore::new())))
        } else {
            Arc::clone(&self.instance.shared)
        };
        let loader = Loader {
            instance: Arc::clone(&self.instance),
            slot,
            base_options: options.fetch_options.clone(),
            runtime,
            clone: options.clone,
        };

        match (options.clone, eager) {
            (true, true) => {
                loader.load(&FetchOptions::new());
            }
            (false, true) => self.fan_in(&loader, options.refresh),
            (_, false) => loader.slot.install_resolved_if_absent(),
        }

        Ok(DictBinding::attach(loader))
    }

    /// Create a binding with default options
    ///
    /// # Errors
    /// See [`DictHandle::use_dict`].
    pub fn use_default(&self) -> Result<DictBinding, DictError> {
        self.use_dict(UseDictOptions::default())
    }

    fn fan_in(&self, loader: &Loader, refresh: bool) {
        match loader.slot.claim_or_current() {
            Claim::First { seq } => loader.spawn(seq, &FetchOptions::new()),
            // A settled ticket has nothing to wait for: load now so the
            // binding's ticket is the one of its own load.
            Claim::Existing(current) if current.is_settled() => {
                if refresh || loader.slot.claim_first_load() {
                    loader.load(&FetchOptions::new());
                }
            }
            Claim::Existing(current) => {
                let follow_up = loader.clone();
                loader.runtime.spawn(async move {
                    // Settlement, not success, releases waiters.
                    let _ = current.wait().await;
                    if refresh || follow_up.slot.claim_first_load() {
                        follow_up.load(&FetchOptions::new());
                    }
                });
            }
        }
    }

    /// Register `code` as a filtered view of this dictionary
    ///
    /// The extension reuses this definition and fetches with the root code,
    /// or with this dictionary's code under [`ExtendCodePolicy::Parent`].
    pub fn extend(&self, code: impl Into<String>, filter: ValueFilter) -> DictHandle {
        let definition = self
            .manager
            .definition(&self.instance.code)
            .unwrap_or_else(|| self.instance.definition.clone());
        let fetch_code = match self.manager.options().extend_code {
            ExtendCodePolicy::Root => self.instance.fetch_code.clone(),
            ExtendCodePolicy::Parent => self.instance.code.clone(),
        };
        self.manager
            .define_scoped(code.into(), definition, filter, fetch_code)
    }
}

impl std::fmt::Debug for DictHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictHandle")
            .field("code", &self.code())
            .field("fetch_code", &self.fetch_code())
            .finish_non_exhaustive()
    }
}
