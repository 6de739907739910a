//! Dictionary instances and load coordination
//!
//! A [`DictInstance`] is one registered code: its resolved definition, value
//! filter and fetch code. Loads run against a [`LoadSlot`], the pairing of a
//! store with its current load ticket. Shared bindings use the instance's
//! slot; clone bindings each get a private one.
//!
//! # Ticket ordering
//!
//! Every load installs a new ticket and records it as pending under its
//! sequence number. When load `n` settles it settles every pending ticket up
//! to `n` in issue order, so an earlier ticket never settles after a later
//! one and no superseded ticket outlives a newer settled load.

use crate::error::LoadError;
use crate::fetch::FetchOptions;
use crate::options::{DictDefinition, ExtraGetter, StaleLoadPolicy};
use crate::store::DictStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use vdict_item::{merge_item, shallow_merge, to_map, DictMap, ValueFilter};
use vdict_signal::Deferred;

/// Completion signal of one load
pub type LoadTicket = Deferred<(), LoadError>;

#[derive(Debug, Default)]
struct SlotState {
    ticket: Option<LoadTicket>,
    pending: Vec<(u64, LoadTicket)>,
    load_claimed: bool,
    issued: u64,
    committed: u64,
}

impl SlotState {
    fn issue(&mut self, ticket: &LoadTicket) -> u64 {
        self.issued += 1;
        self.load_claimed = true;
        self.ticket = Some(ticket.clone());
        self.pending.push((self.issued, ticket.clone()));
        self.issued
    }

    /// Pending tickets issued at or before `seq`, oldest first
    fn take_through(&mut self, seq: u64) -> Vec<LoadTicket> {
        let split = self.pending.partition_point(|(issued, _)| *issued <= seq);
        self.pending
            .drain(..split)
            .map(|(_, ticket)| ticket)
            .collect()
    }
}

/// Outcome of [`LoadSlot::claim_or_current`]
#[derive(Debug)]
pub(crate) enum Claim {
    /// Caller installed the first ticket and must run load `seq`
    First { seq: u64 },

    /// A ticket already exists
    Existing(LoadTicket),
}

/// Store plus its load bookkeeping
#[derive(Debug)]
pub(crate) struct LoadSlot {
    store: Arc<DictStore>,
    state: Mutex<SlotState>,
    // Serializes commits; held while store listeners run, `state` is not.
    writes: Mutex<()>,
}

impl LoadSlot {
    pub(crate) fn new(store: Arc<DictStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SlotState::default()),
            writes: Mutex::new(()),
        }
    }

    pub(crate) fn store(&self) -> &Arc<DictStore> {
        &self.store
    }

    /// Install `ticket` as current and return its load sequence
    pub(crate) fn begin(&self, ticket: &LoadTicket) -> u64 {
        self.state.lock().issue(ticket)
    }

    /// Install the first ticket, or return the current one
    pub(crate) fn claim_or_current(&self) -> Claim {
        let mut state = self.state.lock();
        if let Some(ticket) = &state.ticket {
            return Claim::Existing(ticket.clone());
        }
        let ticket = LoadTicket::new();
        let seq = state.issue(&ticket);
        Claim::First { seq }
    }

    /// Claim the one-shot "first load" flag
    pub(crate) fn claim_first_load(&self) -> bool {
        let mut state = self.state.lock();
        !std::mem::replace(&mut state.load_claimed, true)
    }

    /// Install an already resolved ticket when none exists
    pub(crate) fn install_resolved_if_absent(&self) {
        let mut state = self.state.lock();
        if state.ticket.is_none() {
            state.ticket = Some(LoadTicket::resolved(()));
        }
    }

    /// Current ticket (resolved when no load was ever requested)
    pub(crate) fn current_ticket(&self) -> LoadTicket {
        self.state
            .lock()
            .ticket
            .clone()
            .unwrap_or_else(|| LoadTicket::resolved(()))
    }

    /// Write the result of load `seq`
    ///
    /// Returns `false` when the policy discards it as stale. Store listeners
    /// run after the state lock is released.
    pub(crate) fn commit(&self, seq: u64, map: DictMap, policy: StaleLoadPolicy) -> bool {
        let _write = self.writes.lock();
        {
            let mut state = self.state.lock();
            if policy == StaleLoadPolicy::LastIssued && seq < state.committed {
                return false;
            }
            state.committed = state.committed.max(seq);
        }
        self.store.replace(map);
        true
    }

    /// Resolve every pending ticket up to load `seq`
    pub(crate) fn resolve_through(&self, seq: u64) {
        let tickets = self.state.lock().take_through(seq);
        for ticket in tickets {
            ticket.resolve(());
        }
    }

    /// Reject every pending ticket up to load `seq`
    ///
    /// While nothing was ever committed the first-load claim is released, so
    /// the next waiter or binding retries.
    pub(crate) fn reject_through(&self, seq: u64, err: &LoadError) {
        let tickets = {
            let mut state = self.state.lock();
            if state.committed == 0 {
                state.load_claimed = false;
            }
            state.take_through(seq)
        };
        for ticket in tickets {
            ticket.reject(err.clone());
        }
    }
}

/// One registered dictionary
pub(crate) struct DictInstance {
    pub(crate) code: String,
    pub(crate) fetch_code: String,
    pub(crate) definition: DictDefinition,
    pub(crate) filter: ValueFilter,
    pub(crate) extras: Vec<ExtraGetter>,
    pub(crate) stale_loads: StaleLoadPolicy,
    pub(crate) shared: Arc<LoadSlot>,
}

impl DictInstance {
    /// Compute the map a load commits
    ///
    /// Seed data is rebuilt from a fresh copy on every call. For remote
    /// dictionaries the fetched items are the base and seed fields are
    /// merged onto matching values; seed-only values are dropped.
    pub(crate) async fn build(&self, options: &FetchOptions) -> Result<DictMap, LoadError> {
        let transformer = self.definition.transformer.as_ref();
        let seed = to_map(self.definition.data.clone(), &self.filter, transformer);
        if !self.definition.remote {
            return Ok(seed);
        }

        let fetcher = self
            .definition
            .fetch
            .as_ref()
            .ok_or_else(|| LoadError::MissingFetcher(self.code.clone()))?;
        let items = fetcher
            .fetch(&self.fetch_code, options)
            .await
            .map_err(|err| LoadError::fetch_failed(&self.fetch_code, &err))?;

        let mut map = to_map(items, &self.filter, transformer);
        for (value, local) in &seed {
            if let Some(remote) = map.get_mut(value) {
                merge_item(remote, local);
            }
        }
        Ok(map)
    }
}

/// Runs loads of one binding against its slot
#[derive(Clone)]
pub(crate) struct Loader {
    pub(crate) instance: Arc<DictInstance>,
    pub(crate) slot: Arc<LoadSlot>,
    pub(crate) base_options: FetchOptions,
    pub(crate) runtime: Handle,
    pub(crate) clone: bool,
}

impl Loader {
    /// Start a new load with `extra` merged over the base options
    pub(crate) fn load(&self, extra: &FetchOptions) -> LoadTicket {
        let ticket = LoadTicket::new();
        let seq = self.slot.begin(&ticket);
        self.spawn(seq, extra);
        ticket
    }

    /// Run load `seq`, then settle every pending ticket up to it
    pub(crate) fn spawn(&self, seq: u64, extra: &FetchOptions) {
        let options = shallow_merge(&self.base_options, extra);
        let instance = Arc::clone(&self.instance);
        let slot = Arc::clone(&self.slot);
        let clone = self.clone;

        self.runtime.spawn(async move {
            debug!(code = %instance.code, seq, clone, "loading dictionary");
            match instance.build(&options).await {
                Ok(map) => {
                    let len = map.len();
                    let committed = slot.commit(seq, map, instance.stale_loads);
                    debug!(code = %instance.code, seq, len, committed, "dictionary load settled");
                    slot.resolve_through(seq);
                }
                Err(err) => {
                    warn!(code = %instance.code, seq, error = %err, "dictionary load failed");
                    slot.reject_through(seq, &err);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch_sync;
    use vdict_item::{DictItem, DictValue};

    fn instance(definition: DictDefinition, filter: ValueFilter) -> DictInstance {
        DictInstance {
            code: "STATUS".to_string(),
            fetch_code: "STATUS".to_string(),
            definition,
            filter,
            extras: Vec::new(),
            stale_loads: StaleLoadPolicy::default(),
            shared: Arc::new(LoadSlot::new(Arc::new(DictStore::new()))),
        }
    }

    #[tokio::test]
    async fn local_build_is_the_seed_map() {
        let definition = DictDefinition::new()
            .with_item("ON", DictItem::labeled("On"))
            .with_item("OFF", DictItem::labeled("Off"));
        let map = instance(definition, ValueFilter::new().omit(["OFF"]))
            .build(&FetchOptions::new())
            .await
            .unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map[&DictValue::from("ON")].label(), Some("On"));
    }

    #[tokio::test]
    async fn remote_build_layers_seed_over_fetched_items() {
        let definition = DictDefinition::new()
            .with_item("X", DictItem::labeled("local").with_field("extra", 1))
            .with_item("LOCAL_ONLY", DictItem::labeled("dropped"))
            .remote(true)
            .with_fetch(fetch_sync(|_, _| {
                Ok(vec![DictItem::new("X", "remote").with_field("other", 2)])
            }));
        let map = instance(definition, ValueFilter::new())
            .build(&FetchOptions::new())
            .await
            .unwrap();

        let x = &map[&DictValue::from("X")];
        assert_eq!(x.label(), Some("local"));
        assert_eq!(x.field("extra"), Some(&serde_json::json!(1)));
        assert_eq!(x.field("other"), Some(&serde_json::json!(2)));
        assert!(!map.contains_key(&DictValue::from("LOCAL_ONLY")));
    }

    #[tokio::test]
    async fn remote_without_fetcher_fails() {
        let err = instance(DictDefinition::new().remote(true), ValueFilter::new())
            .build(&FetchOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::MissingFetcher("STATUS".to_string()));
    }

    #[test]
    fn first_claim_is_exclusive() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        let first = slot.claim_or_current();
        let second = slot.claim_or_current();

        let Claim::First { seq } = first else {
            panic!("first claim must install the ticket");
        };
        assert_eq!(seq, 1);
        let ticket = slot.current_ticket();
        assert!(matches!(second, Claim::Existing(current) if current.same_as(&ticket)));
        assert!(!slot.claim_first_load());
    }

    #[test]
    fn resolved_placeholder_leaves_first_load_unclaimed() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        slot.install_resolved_if_absent();

        assert!(slot.current_ticket().is_settled());
        assert!(slot.claim_first_load());
        assert!(!slot.claim_first_load());
    }

    #[test]
    fn last_issued_discards_stale_commits() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        let first = slot.begin(&LoadTicket::new());
        let second = slot.begin(&LoadTicket::new());

        let mut newer = DictMap::new();
        newer.insert(DictValue::from(2), DictItem::new(2, "new"));
        assert!(slot.commit(second, newer, StaleLoadPolicy::LastIssued));

        let mut older = DictMap::new();
        older.insert(DictValue::from(1), DictItem::new(1, "old"));
        assert!(!slot.commit(first, older.clone(), StaleLoadPolicy::LastIssued));
        assert!(slot.store().get(&DictValue::from(2)).is_some());

        assert!(slot.commit(first, older, StaleLoadPolicy::LastSettled));
        assert!(slot.store().get(&DictValue::from(1)).is_some());
    }

    #[test]
    fn settling_a_load_settles_every_earlier_ticket() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        let tickets: Vec<LoadTicket> = (0..3).map(|_| LoadTicket::new()).collect();
        let seqs: Vec<u64> = tickets.iter().map(|ticket| slot.begin(ticket)).collect();

        slot.resolve_through(seqs[1]);
        assert!(tickets[0].is_settled());
        assert!(tickets[1].is_settled());
        assert!(!tickets[2].is_settled());

        slot.resolve_through(seqs[0]);
        assert!(!tickets[2].is_settled());
        slot.resolve_through(seqs[2]);
        assert!(tickets[2].is_settled());
    }

    #[test]
    fn failed_first_load_releases_the_claim() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        let Claim::First { seq } = slot.claim_or_current() else {
            panic!("empty slot must hand out the first claim");
        };
        slot.reject_through(seq, &LoadError::MissingFetcher("STATUS".to_string()));

        assert!(slot.current_ticket().is_settled());
        assert!(slot.claim_first_load());
    }

    #[test]
    fn failure_after_a_commit_keeps_the_claim() {
        let slot = LoadSlot::new(Arc::new(DictStore::new()));
        let first = slot.begin(&LoadTicket::new());
        assert!(slot.commit(first, DictMap::new(), StaleLoadPolicy::LastSettled));
        slot.resolve_through(first);

        let second = slot.begin(&LoadTicket::new());
        slot.reject_through(second, &LoadError::MissingFetcher("STATUS".to_string()));
        assert!(!slot.claim_first_load());
    }
}
