use std::sync::Arc;

use time::OffsetDateTime;

use crate::{
    content::{EventRecord, FetchError},
    query::QueryKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Entry payload. Data exists only on success and an error only on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Idle,
    Loading,
    Success(Arc<[EventRecord]>),
    Error(FetchError),
}

/// Snapshot of one cached query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub state: EntryState,
    /// Instant the settling fetch was issued; the "now" its filter used.
    pub fetched_at: Option<OffsetDateTime>,
}

impl CacheEntry {
    pub(crate) fn idle(key: QueryKey) -> Self {
        Self {
            key,
            state: EntryState::Idle,
            fetched_at: None,
        }
    }

    pub(crate) fn loading(key: QueryKey) -> Self {
        Self {
            key,
            state: EntryState::Loading,
            fetched_at: None,
        }
    }

    pub(crate) fn settled(
        key: QueryKey,
        outcome: Result<Vec<EventRecord>, FetchError>,
        fetched_at: OffsetDateTime,
    ) -> Self {
        let state = match outcome {
            Ok(records) => EntryState::Success(records.into()),
            Err(error) => EntryState::Error(error),
        };
        Self {
            key,
            state,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn status(&self) -> FetchStatus {
        match self.state {
            EntryState::Idle => FetchStatus::Idle,
            EntryState::Loading => FetchStatus::Loading,
            EntryState::Success(_) => FetchStatus::Success,
            EntryState::Error(_) => FetchStatus::Error,
        }
    }

    pub fn data(&self) -> Option<&Arc<[EventRecord]>> {
        match &self.state {
            EntryState::Success(records) => Some(records),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.state {
            EntryState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// True once the entry reached success or error.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, EntryState::Success(_) | EntryState::Error(_))
    }
}
