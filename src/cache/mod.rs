//! Query cache and fetch coordination.
//!
//! A [`QueryCache`] keeps one entry per [`crate::query::QueryKey`]. Entries
//! move `Idle -> Loading -> Success | Error` and stay settled until an
//! explicit refresh; concurrent requests for a key share one in-flight fetch.

mod coordinator;
mod entry;

pub use coordinator::{QueryCache, Subscription};
pub use entry::{CacheEntry, EntryState, FetchStatus};

pub(crate) use coordinator::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_DEDUP, METRIC_FETCH_FAILED, METRIC_FETCH_MS,
};
