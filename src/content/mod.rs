//! Content store access: the query transport seam and record shaping.

mod client;
mod error;
mod records;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;

use crate::query::QueryDescriptor;

pub use client::ContentClient;
pub use error::FetchError;
pub use records::{DoorsOpen, EventRecord, Performer, Venue, shape_events};

/// Executes a structured query and returns the raw rows.
///
/// `now` is the instant captured by the caller; it is bound to every
/// parameter the descriptor declares.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        now: OffsetDateTime,
    ) -> Result<Vec<Value>, FetchError>;
}

#[async_trait]
impl<S: ContentSource + ?Sized> ContentSource for Arc<S> {
    async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        now: OffsetDateTime,
    ) -> Result<Vec<Value>, FetchError> {
        (**self).fetch(descriptor, now).await
    }
}

/// Run `descriptor` against `source` and shape the rows into records.
pub async fn run_query<S: ContentSource + ?Sized>(
    source: &S,
    descriptor: &QueryDescriptor,
    now: OffsetDateTime,
) -> Result<Vec<EventRecord>, FetchError> {
    let rows = source.fetch(descriptor, now).await?;
    let limit = usize::try_from(descriptor.window().limit).unwrap_or(usize::MAX);
    Ok(shape_events(rows, now, limit))
}

/// Fetch the next upcoming events, capturing "now" at call time.
pub async fn fetch_upcoming_events<S: ContentSource + ?Sized>(
    source: &S,
) -> Result<Vec<EventRecord>, FetchError> {
    run_query(
        source,
        &QueryDescriptor::upcoming_events(),
        OffsetDateTime::now_utc(),
    )
    .await
}
