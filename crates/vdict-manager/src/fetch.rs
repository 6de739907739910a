//! Remote item fetchers
//!
//! A remote dictionary asks its [`DictFetcher`] for items on every load. The
//! fetcher receives the effective code (the origin code for extensions) and
//! the binding's fetch options.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use vdict_item::DictItem;

/// Options forwarded to the fetcher (query parameters, paging, ..)
pub type FetchOptions = Map<String, Value>;

/// Source of remote dictionary items
#[async_trait]
pub trait DictFetcher: Send + Sync {
    /// Fetch the items of dictionary `code`
    ///
    /// # Errors
    /// Any error rejects the load ticket; the store keeps its contents.
    async fn fetch(&self, code: &str, options: &FetchOptions) -> anyhow::Result<Vec<DictItem>>;
}

/// Fetcher backed by an async closure
pub struct FnFetcher<F> {
    f: F,
}

/// Adapt an async closure into a [`DictFetcher`]
///
/// ```rust
/// use vdict_manager::fetch_fn;
/// use vdict_item::DictItem;
///
/// let fetcher = fetch_fn(|code, _options| async move {
///     Ok::<_, anyhow::Error>(vec![DictItem::new(code, "from server")])
/// });
/// # let _ = fetcher;
/// ```
pub fn fetch_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(String, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<DictItem>>> + Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> DictFetcher for FnFetcher<F>
where
    F: Fn(String, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<DictItem>>> + Send,
{
    async fn fetch(&self, code: &str, options: &FetchOptions) -> anyhow::Result<Vec<DictItem>> {
        (self.f)(code.to_string(), options.clone()).await
    }
}

/// Fetcher backed by a synchronous closure
pub struct SyncFetcher<F> {
    f: F,
}

/// Adapt a synchronous closure into a [`DictFetcher`]
pub fn fetch_sync<F>(f: F) -> SyncFetcher<F>
where
    F: Fn(&str, &FetchOptions) -> anyhow::Result<Vec<DictItem>> + Send + Sync,
{
    SyncFetcher { f }
}

#[async_trait]
impl<F> DictFetcher for SyncFetcher<F>
where
    F: Fn(&str, &FetchOptions) -> anyhow::Result<Vec<DictItem>> + Send + Sync,
{
    async fn fetch(&self, code: &str, options: &FetchOptions) -> anyhow::Result<Vec<DictItem>> {
        (self.f)(code, options)
    }
}

/// Reads `<dir>/<code>.json`, a JSON array of items
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    dir: PathBuf,
}

impl DirectoryFetcher {
    /// Create fetcher rooted at `dir`
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path holding the items of `code`
    #[must_use]
    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.json"))
    }
}

#[async_trait]
impl DictFetcher for DirectoryFetcher {
    async fn fetch(&self, code: &str, _options: &FetchOptions) -> anyhow::Result<Vec<DictItem>> {
        let path = self.path_for(code);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("decoding {}", path.display()))
    }
}
