//! vdict Dictionary Manager
//!
//! Registry of named dictionaries with coordinated loading, shared and
//! cloned stores, and derived views.
//!
//! # Core Concepts
//!
//! - [`DictManager`]: Registry owning every store and resolved definition
//! - [`DictHandle`]: Use function of one code; creates bindings and extensions
//! - [`DictBinding`]: One consumer's live views (`list`, `map`, `e`) and load operations
//! - [`LoadTicket`]: Completion signal of a load, settled after the commit
//! - [`DictFetcher`]: Caller-supplied remote item source
//!
//! # Example
//!
//! ```rust
//! use vdict_manager::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DictError> {
//! let manager = DictManager::default();
//! let status = manager.define(
//!     "STATUS",
//!     DictDefinition::new()
//!         .with_item("SUCCESS", DictItem::new(1, "Success"))
//!         .with_item("FAIL", DictItem::new(2, "Fail")),
//! );
//!
//! let binding = status.use_default()?;
//! binding.load_promise().await?;
//!
//! assert_eq!(binding.list().len(), 2);
//! let success = binding.get_item(Some(&DictValue::from(1))).into_option();
//! assert_eq!(success.as_ref().and_then(DictItem::label), Some("Success"));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod binding;
pub mod config;
pub mod error;
pub mod fetch;
mod instance;
pub mod options;
pub mod projector;
pub mod registry;
pub mod store;

// Re-exports
pub use binding::{DictBinding, ItemLookup};
pub use config::{CatalogConfig, CatalogFormat, DictionaryConfig};
pub use error::{CatalogError, DictError, LoadError};
pub use fetch::{
    fetch_fn, fetch_sync, DictFetcher, DirectoryFetcher, FetchOptions, FnFetcher, SyncFetcher,
};
pub use instance::LoadTicket;
pub use options::{
    DictDefinition, ExtendCodePolicy, ExtraGetter, ManagerOptions, StaleLoadPolicy,
    UseDictOptions,
};
pub use projector::DictViews;
pub use registry::{DictHandle, DictManager};
pub use store::DictStore;

/// Prelude for common imports
pub mod prelude {
    pub use crate::binding::{DictBinding, ItemLookup};
    pub use crate::error::{DictError, LoadError};
    pub use crate::fetch::{fetch_fn, DictFetcher, FetchOptions};
    pub use crate::options::{DictDefinition, ManagerOptions, UseDictOptions};
    pub use crate::registry::{DictHandle, DictManager};
    pub use vdict_item::{DictItem, DictValue, ValueFilter};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
