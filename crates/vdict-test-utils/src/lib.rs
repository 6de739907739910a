//! Testing utilities for the vdict workspace
//!
//! Shared fixtures and instrumented fetchers.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use vdict_item::{DictItem, DictRecord};
use vdict_manager::{DictFetcher, FetchOptions};

/// Install a test-writer tracing subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Keyed record from `(key, item)` pairs
pub fn record<'a>(entries: impl IntoIterator<Item = (&'a str, DictItem)>) -> DictRecord {
    entries
        .into_iter()
        .map(|(key, item)| (key.to_string(), item))
        .collect()
}

/// `LOADING` / `SUCCESS` / `ERROR` seed data; `ERROR` has a null value
pub fn status_data() -> DictRecord {
    record([
        ("LOADING", DictItem::new(1, "Loading").with_field("color", "blue")),
        ("SUCCESS", DictItem::new(2, "Success").with_field("color", "green")),
        (
            "ERROR",
            DictItem::labeled("Error").with_value(vdict_item::DictValue::Null),
        ),
    ])
}

/// Server-side items for a `CITY` style dictionary
pub fn city_items() -> Vec<DictItem> {
    vec![
        DictItem::new("PAR", "Paris").with_field("country", "FR"),
        DictItem::new("BER", "Berlin").with_field("country", "DE"),
        DictItem::new("ROM", "Rome").with_field("country", "IT"),
    ]
}

#[derive(Default)]
struct CountingState {
    calls: AtomicUsize,
    codes: Mutex<Vec<String>>,
    options: Mutex<Vec<FetchOptions>>,
    items: Mutex<Vec<DictItem>>,
    delay: Mutex<Option<Duration>>,
    fail_next: AtomicBool,
}

/// Fetcher returning fixed items and recording every call
///
/// Clones share state, so a test keeps one clone to inspect calls.
#[derive(Clone, Default)]
pub struct CountingFetcher {
    state: Arc<CountingState>,
}

impl CountingFetcher {
    pub fn new(items: Vec<DictItem>) -> Self {
        let fetcher = Self::default();
        fetcher.set_items(items);
        fetcher
    }

    /// Sleep before answering each call
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock() = Some(delay);
        self
    }

    pub fn set_items(&self, items: Vec<DictItem>) {
        *self.state.items.lock() = items;
    }

    /// Make the next call fail
    pub fn fail_next(&self) {
        self.state.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn codes(&self) -> Vec<String> {
        self.state.codes.lock().clone()
    }

    pub fn last_options(&self) -> Option<FetchOptions> {
        self.state.options.lock().last().cloned()
    }
}

#[async_trait]
impl DictFetcher for CountingFetcher {
    async fn fetch(&self, code: &str, options: &FetchOptions) -> anyhow::Result<Vec<DictItem>> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.codes.lock().push(code.to_string());
        self.state.options.lock().push(options.clone());

        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("fetch of {code} failed");
        }
        Ok(self.state.items.lock().clone())
    }
}

type Reply = anyhow::Result<Vec<DictItem>>;

struct ScriptState {
    replies: Mutex<Vec<Option<oneshot::Sender<Reply>>>>,
    calls: watch::Sender<usize>,
}

/// Fetcher whose calls stay pending until the test answers them
///
/// Calls are numbered from 0 in arrival order.
#[derive(Clone)]
pub struct ScriptedFetcher {
    state: Arc<ScriptState>,
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            state: Arc::new(ScriptState {
                replies: Mutex::new(Vec::new()),
                calls,
            }),
        }
    }

    pub fn calls(&self) -> usize {
        *self.state.calls.borrow()
    }

    /// Wait until at least `n` calls arrived
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.state.calls.subscribe();
        let _ = calls.wait_for(|count| *count >= n).await;
    }

    /// Answer call `index` with `items`
    pub fn respond(&self, index: usize, items: Vec<DictItem>) -> bool {
        self.reply(index, Ok(items))
    }

    /// Fail call `index`
    pub fn fail(&self, index: usize, message: &str) -> bool {
        self.reply(index, Err(anyhow::anyhow!(message.to_string())))
    }

    fn reply(&self, index: usize, reply: Reply) -> bool {
        let sender = self
            .state
            .replies
            .lock()
            .get_mut(index)
            .and_then(Option::take);
        sender.is_some_and(|sender| sender.send(reply).is_ok())
    }
}

#[async_trait]
impl DictFetcher for ScriptedFetcher {
    async fn fetch(&self, _code: &str, _options: &FetchOptions) -> anyhow::Result<Vec<DictItem>> {
        let (tx, rx) = oneshot::channel();
        self.state.replies.lock().push(Some(tx));
        self.state.calls.send_modify(|count| *count += 1);
        rx.await
            .map_err(|_| anyhow::anyhow!("scripted reply dropped"))?
    }
}
