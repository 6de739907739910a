//! Observable cell with change notification
//!
//! [`ObservableCell`] holds a value and notifies listeners after every
//! committed write. Each write bumps a version; listeners receive the value
//! snapshot together with the version it was taken at, so they can discard
//! out-of-order notifications.
//!
//! Listeners run synchronously on the writing thread, outside every lock the
//! cell holds. Async consumers use [`ObservableCell::watch`] instead.

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T, u64) + Send + Sync>;
type ListenerSet<T> = Mutex<Vec<(u64, Listener<T>)>>;

/// Value container with change notification
pub struct ObservableCell<T> {
    value: RwLock<T>,
    listeners: Arc<ListenerSet<T>>,
    next_listener: AtomicU64,
    versions: watch::Sender<u64>,
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCell")
            .field("value", &*self.value.read())
            .field("version", &*self.versions.borrow())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ObservableCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create cell holding `initial` at version 0
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (versions, _) = watch::channel(0);
        Self {
            value: RwLock::new(initial),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
            versions,
        }
    }

    /// Snapshot of the current value
    #[inline]
    #[must_use]
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read the current value in place
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Current version (number of committed writes)
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.versions.borrow()
    }

    /// Replace the value and notify
    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutate the value in place and notify
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.value.write();
        f(&mut guard);
        let mut version = 0;
        self.versions.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        let snapshot = T::clone(&RwLockWriteGuard::downgrade(guard));
        self.notify(&snapshot, version);
    }

    fn notify(&self, snapshot: &T, version: u64) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot, version);
        }
    }

    /// Register `listener` for future writes
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&T, u64) + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Version receiver for async consumers
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.versions.subscribe()
    }
}

/// Listener registration guard
///
/// Unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
