//! vdict Signals
//!
//! Framework-independent reactive primitives used by the dictionary cache.
//!
//! - [`Deferred`]: Completion handle settled from outside (load tickets)
//! - [`ObservableCell`]: Value container that notifies listeners after
//!   every committed write
//!
//! # Example
//!
//! ```rust
//! use vdict_signal::{Deferred, ObservableCell};
//!
//! let cell = ObservableCell::new(0u32);
//! let _sub = cell.subscribe(|value, version| println!("v{version}: {value}"));
//! cell.set(1);
//!
//! let done = Deferred::<(), String>::new();
//! assert!(done.resolve(()));
//! assert!(!done.reject("late".to_string()));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod deferred;
pub mod observable;

// Re-exports
pub use deferred::{Deferred, Outcome};
pub use observable::{ObservableCell, Subscription};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
