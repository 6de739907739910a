//! vdict Item Model
//!
//! Dictionary items, their value keys, and the codec that turns seed records
//! or fetched lists into a canonical value-keyed map.
//!
//! # Core Concepts
//!
//! - [`DictValue`]: Scalar key of an item (`Undefined` and `Null` are distinct)
//! - [`DictItem`]: `{value, label, ..extra}` record
//! - [`DictMap`]: Insertion-ordered value → item map backing a dictionary
//! - [`to_map`] / [`map_to_list`] / [`map_to_obj`]: Codec and projections
//! - [`deep_merge`] / [`merge_item`]: Layering local overrides onto fetched data
//!
//! # Example
//!
//! ```rust
//! use vdict_item::{to_map, DictItem, DictRecord, DictValue, ValueFilter};
//!
//! let mut data = DictRecord::new();
//! data.insert("SUCCESS".to_string(), DictItem::labeled("Success"));
//!
//! let map = to_map(data, &ValueFilter::new(), None);
//! assert_eq!(map[&DictValue::from("SUCCESS")].label(), Some("Success"));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod codec;
pub mod item;
pub mod merge;
pub mod value;

// Re-exports
pub use codec::{
    map_to_keys, map_to_list, map_to_obj, to_map, to_map_into, DictMap, DictRecord, DictSource,
    ItemTransformer, KeyMap, ValueFilter, ValueTransformer,
};
pub use item::{DictItem, ItemError};
pub use merge::{deep_merge, merge_item, shallow_merge};
pub use value::DictValue;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
