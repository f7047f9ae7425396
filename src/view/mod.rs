//! Presentation-facing view of the upcoming-events query.

mod text;

use std::sync::Arc;

use crate::{
    cache::{CacheEntry, EntryState, QueryCache},
    content::{ContentSource, EventRecord},
    query::QueryDescriptor,
};

pub use text::render_text;

/// What the presentation layer shows for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error { message: String },
    Empty,
    Populated { events: Arc<[EventRecord]> },
}

impl ViewState {
    /// Map an entry (or its absence) to a view state. Total and pure.
    pub fn project(entry: Option<&CacheEntry>) -> Self {
        let Some(entry) = entry else {
            return Self::Loading;
        };
        match &entry.state {
            EntryState::Idle | EntryState::Loading => Self::Loading,
            EntryState::Error(error) => Self::Error {
                message: error.message().to_string(),
            },
            EntryState::Success(events) if events.is_empty() => Self::Empty,
            EntryState::Success(events) => Self::Populated {
                events: Arc::clone(events),
            },
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        match self {
            Self::Populated { events } => &events[..],
            _ => &[],
        }
    }
}

impl From<&CacheEntry> for ViewState {
    fn from(entry: &CacheEntry) -> Self {
        Self::project(Some(entry))
    }
}

/// The single consumer-facing capability: the upcoming-events listing.
pub struct UpcomingEvents<S> {
    cache: QueryCache<S>,
    descriptor: QueryDescriptor,
}

impl<S> UpcomingEvents<S>
where
    S: ContentSource + 'static,
{
    pub fn new(cache: QueryCache<S>) -> Self {
        Self {
            cache,
            descriptor: QueryDescriptor::upcoming_events(),
        }
    }

    /// Current view, starting the first fetch if needed.
    pub fn view(&self) -> ViewState {
        ViewState::from(&self.cache.get(&self.descriptor))
    }

    /// View once the query has settled.
    pub async fn load(&self) -> ViewState {
        ViewState::from(&self.cache.load(&self.descriptor).await)
    }

    /// Issue a new request and return the view once it settles.
    pub async fn reload(&self) -> ViewState {
        ViewState::from(&self.cache.refresh(&self.descriptor).settled().await)
    }

    pub fn cache(&self) -> &QueryCache<S> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::content::FetchError;
    use crate::query::QueryKey;

    fn entry(state: EntryState) -> CacheEntry {
        CacheEntry {
            key: QueryKey::derive(&QueryDescriptor::upcoming_events()),
            state,
            fetched_at: None,
        }
    }

    fn event(id: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            name: format!("Event {id}"),
            slug: id.to_string(),
            starts_at: datetime!(2099-01-01 20:00 UTC),
            doors_open: None,
            venue: None,
            headline: None,
            image: None,
            tickets: None,
        }
    }

    #[test]
    fn absent_and_pending_entries_project_to_loading() {
        assert_eq!(ViewState::project(None), ViewState::Loading);
        assert_eq!(
            ViewState::project(Some(&entry(EntryState::Idle))),
            ViewState::Loading
        );
        assert_eq!(
            ViewState::project(Some(&entry(EntryState::Loading))),
            ViewState::Loading
        );
    }

    #[test]
    fn error_projects_message() {
        let state = ViewState::from(&entry(EntryState::Error(FetchError::failed("timeout"))));
        assert_eq!(
            state,
            ViewState::Error {
                message: "timeout".to_string()
            }
        );
    }

    #[test]
    fn success_splits_on_emptiness() {
        let empty = ViewState::from(&entry(EntryState::Success(
            Vec::<EventRecord>::new().into(),
        )));
        assert_eq!(empty, ViewState::Empty);
        assert!(empty.events().is_empty());

        let populated = ViewState::from(&entry(EntryState::Success(
            vec![event("a"), event("b")].into(),
        )));
        let ids: Vec<_> = populated.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
