//! Query cache and fetch coordinator.
//!
//! Owns one slot per [`QueryKey`]. A slot holds the latest [`CacheEntry`] in a
//! `watch` channel, so every transition reaches all live subscribers in one
//! `send_replace`, and remembers the generation of its in-flight fetch so
//! concurrent requests attach to it instead of issuing another.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;

use dashmap::DashMap;
use metrics::{counter, histogram};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    content::{ContentSource, EventRecord, FetchError, run_query},
    query::{QueryDescriptor, QueryKey},
};

use super::entry::{CacheEntry, EntryState, FetchStatus};

pub(crate) const METRIC_CACHE_HIT: &str = "marquee_query_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "marquee_query_cache_miss_total";
pub(crate) const METRIC_DEDUP: &str = "marquee_query_dedup_total";
pub(crate) const METRIC_FETCH_FAILED: &str = "marquee_query_fetch_failed_total";
pub(crate) const METRIC_FETCH_MS: &str = "marquee_query_fetch_ms";

/// In-memory query cache in front of a [`ContentSource`].
///
/// Cheap to clone; clones share the same slots. Entries never expire: a
/// settled entry stays as it is until [`QueryCache::refresh`] or
/// [`QueryCache::invalidate`]. Methods that may start a fetch spawn it on the
/// current Tokio runtime.
pub struct QueryCache<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for QueryCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    source: S,
    slots: DashMap<QueryKey, Slot>,
    generations: AtomicU64,
}

struct Slot {
    state: watch::Sender<CacheEntry>,
    in_flight: Option<u64>,
    /// Invalidated while its fetch was running. Hidden from readers; the
    /// fetch result is dropped unless a new request adopts it first.
    orphaned: bool,
}

impl Slot {
    fn new(key: QueryKey) -> Self {
        let (state, _) = watch::channel(CacheEntry::idle(key));
        Self {
            state,
            in_flight: None,
            orphaned: false,
        }
    }

    /// Decide whether a request starts a new fetch. Returns its generation if so.
    fn begin(&mut self, key: &QueryKey, force: bool, generations: &AtomicU64) -> Option<u64> {
        if let Some(generation) = self.in_flight {
            if self.orphaned {
                self.orphaned = false;
                self.state.send_replace(CacheEntry::loading(key.clone()));
            }
            counter!(METRIC_DEDUP).increment(1);
            debug!(%key, generation, "attaching to in-flight fetch");
            return None;
        }

        let status = self.state.borrow().status();
        if !force && status != FetchStatus::Idle {
            counter!(METRIC_CACHE_HIT).increment(1);
            return None;
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        self.orphaned = false;
        let generation = generations.fetch_add(1, Ordering::Relaxed) + 1;
        self.in_flight = Some(generation);
        self.state.send_replace(CacheEntry::loading(key.clone()));
        Some(generation)
    }
}

impl<S> QueryCache<S>
where
    S: ContentSource + 'static,
{
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                slots: DashMap::new(),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Current entry for `descriptor`, starting a fetch if none was made yet.
    pub fn get(&self, descriptor: &QueryDescriptor) -> CacheEntry {
        self.attach(descriptor, false).current()
    }

    /// Live handle on the entry for `descriptor`, starting a fetch if none was
    /// made yet. Dropping the handle detaches it; the fetch still completes.
    pub fn subscribe(&self, descriptor: &QueryDescriptor) -> Subscription {
        self.attach(descriptor, false)
    }

    /// Wait until the entry for `descriptor` has settled.
    pub async fn load(&self, descriptor: &QueryDescriptor) -> CacheEntry {
        self.subscribe(descriptor).settled().await
    }

    /// Explicit new request: fetch again unless a fetch is already running,
    /// in which case the returned handle follows that one.
    pub fn refresh(&self, descriptor: &QueryDescriptor) -> Subscription {
        self.attach(descriptor, true)
    }

    /// Entry for `descriptor` without side effects.
    pub fn peek(&self, descriptor: &QueryDescriptor) -> Option<CacheEntry> {
        let key = QueryKey::derive(descriptor);
        self.inner
            .slots
            .get(&key)
            .filter(|slot| !slot.orphaned)
            .map(|slot| CacheEntry::clone(&slot.state.borrow()))
    }

    /// Discard the entry for `descriptor`.
    ///
    /// A fetch still running for it keeps its place as the key's only
    /// in-flight request: a request made before it completes attaches to it
    /// and receives its result, otherwise the result is dropped. Existing
    /// subscriptions are closed either way.
    pub fn invalidate(&self, descriptor: &QueryDescriptor) -> bool {
        let key = QueryKey::derive(descriptor);

        if let Some(mut slot) = self.inner.slots.get_mut(&key) {
            if slot.in_flight.is_some() {
                if slot.orphaned {
                    return false;
                }
                slot.orphaned = true;
                slot.state = watch::channel(CacheEntry::idle(key.clone())).0;
                debug!(%key, "cache entry invalidated with fetch in flight");
                return true;
            }
        }

        let removed = self
            .inner
            .slots
            .remove_if(&key, |_, slot| slot.in_flight.is_none())
            .is_some();
        if removed {
            debug!(%key, "cache entry invalidated");
        }
        removed
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.inner
            .slots
            .iter()
            .filter(|slot| !slot.orphaned)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    fn attach(&self, descriptor: &QueryDescriptor, force: bool) -> Subscription {
        let key = QueryKey::derive(descriptor);
        let (receiver, started) = {
            let mut slot = self
                .inner
                .slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone()));
            let receiver = slot.state.subscribe();
            let started = slot.begin(&key, force, &self.inner.generations);
            (receiver, started)
        };

        if let Some(generation) = started {
            self.spawn_fetch(key, descriptor.clone(), generation);
        }

        Subscription { receiver }
    }

    fn spawn_fetch(&self, key: QueryKey, descriptor: QueryDescriptor, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let span = info_span!("query_fetch", key = %key, generation);
        tokio::spawn(
            async move {
                let now = OffsetDateTime::now_utc();
                let started_at = Instant::now();
                let outcome = run_query(&inner.source, &descriptor, now).await;
                histogram!(METRIC_FETCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
                inner.settle(&key, generation, outcome, now);
            }
            .instrument(span),
        );
    }
}

impl<S> Inner<S> {
    fn settle(
        &self,
        key: &QueryKey,
        generation: u64,
        outcome: Result<Vec<EventRecord>, FetchError>,
        fetched_at: OffsetDateTime,
    ) {
        let Some(mut slot) = self.slots.get_mut(key) else {
            debug!(%key, "entry discarded before fetch settled");
            return;
        };
        if slot.in_flight != Some(generation) {
            debug!(%key, "fetch superseded");
            return;
        }
        slot.in_flight = None;

        if slot.orphaned {
            drop(slot);
            self.slots
                .remove_if(key, |_, slot| slot.orphaned && slot.in_flight.is_none());
            debug!(%key, "entry discarded before fetch settled");
            return;
        }

        let entry = CacheEntry::settled(key.clone(), outcome, fetched_at);
        match &entry.state {
            EntryState::Success(records) => {
                debug!(%key, records = records.len(), "query settled");
            }
            EntryState::Error(error) => {
                counter!(METRIC_FETCH_FAILED).increment(1);
                warn!(%key, error = %error, "query failed");
            }
            EntryState::Idle | EntryState::Loading => {}
        }
        slot.state.send_replace(entry);
    }
}

/// Live view of one cache entry.
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<CacheEntry>,
}

impl Subscription {
    pub fn current(&self) -> CacheEntry {
        CacheEntry::clone(&self.receiver.borrow())
    }

    /// Wait for the next transition. `None` once the entry was discarded.
    pub async fn changed(&mut self) -> Option<CacheEntry> {
        self.receiver.changed().await.ok()?;
        Some(CacheEntry::clone(&self.receiver.borrow_and_update()))
    }

    /// Wait until the entry is settled. If the entry is discarded first, the
    /// last state seen is returned.
    pub async fn settled(mut self) -> CacheEntry {
        let settled = self
            .receiver
            .wait_for(CacheEntry::is_settled)
            .await
            .map(|entry| CacheEntry::clone(&entry));
        match settled {
            Ok(entry) => entry,
            Err(_) => self.current(),
        }
    }
}
