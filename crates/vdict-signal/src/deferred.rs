//! Deferred completion handle
//!
//! A [`Deferred`] is a future-like value whose outcome is set from outside
//! through [`Deferred::resolve`] / [`Deferred::reject`]. Handles are cheap to
//! clone and every clone observes the same outcome.
//!
//! The first settlement wins; later calls are no-ops.

use futures::future::BoxFuture;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tokio::sync::watch;

/// Settled outcome of a [`Deferred`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// Completed with a value
    Resolved(T),
    /// Completed with a failure
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    /// Convert into a `Result`
    #[inline]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

/// Externally settled completion signal
pub struct Deferred<T, E> {
    state: Arc<watch::Sender<Option<Outcome<T, E>>>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            None => "pending",
            Some(Outcome::Resolved(_)) => "resolved",
            Some(Outcome::Rejected(_)) => "rejected",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Create pending handle
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Create handle already resolved with `value`
    #[must_use]
    pub fn resolved(value: T) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    /// Resolve with `value`
    ///
    /// Returns `false` if the handle was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Outcome::Resolved(value))
    }

    /// Reject with `reason`
    ///
    /// Returns `false` if the handle was already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Outcome::Rejected(reason))
    }

    fn settle(&self, outcome: Outcome<T, E>) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(outcome);
            true
        })
    }

    /// Whether resolve or reject has happened
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Current outcome, if settled
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        self.state.borrow().clone()
    }

    /// Whether two handles share the same completion
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Wait for settlement
    ///
    /// The returned future owns a clone of the handle, so it can outlive
    /// `self` and be moved into spawned tasks.
    pub fn wait(&self) -> impl Future<Output = Result<T, E>> + Send + 'static
    where
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let state = Arc::clone(&self.state);
        let mut rx = state.subscribe();
        async move {
            let outcome = rx
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|settled| settled.clone());
            drop(state);
            match outcome {
                Some(outcome) => outcome.into_result(),
                // Sender is held above, so the channel cannot close first.
                None => std::future::pending().await,
            }
        }
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
