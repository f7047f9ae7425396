//! Typed event records and the shaping of raw rows into them.

use marquee_content_types::RawEvent;
use serde::Serialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;
use url::Url;

use crate::assets::AssetRef;

/// An upcoming event. Immutable once shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    pub doors_open: Option<DoorsOpen>,
    pub venue: Option<Venue>,
    pub headline: Option<Performer>,
    pub image: Option<AssetRef>,
    pub tickets: Option<Url>,
}

/// Hour of the day (0-23) at which doors open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DoorsOpen(u8);

impl DoorsOpen {
    pub fn new(hour: i64) -> Option<Self> {
        u8::try_from(hour).ok().filter(|h| *h < 24).map(Self)
    }

    pub fn hour(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Venue {
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Venue {
    /// `name, city, country`, skipping the parts that are missing.
    pub fn display_line(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.city.as_deref())
            .chain(self.country.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Performer {
    pub name: String,
}

impl EventRecord {
    /// Shape one decoded row. Returns `None` when the row lacks an id or a
    /// parseable start time; every other field degrades to absent.
    pub fn from_raw(raw: RawEvent) -> Option<Self> {
        let id = raw.id.filter(|id| !id.is_empty())?;
        let starts_at = OffsetDateTime::parse(raw.date.as_deref()?, &Rfc3339).ok()?;

        Some(Self {
            id,
            name: raw.name.unwrap_or_default(),
            slug: raw
                .slug
                .map(|slug| slug.as_str().to_string())
                .unwrap_or_default(),
            starts_at,
            doors_open: raw.doors_open.and_then(DoorsOpen::new),
            venue: raw.venue.and_then(|venue| {
                Some(Venue {
                    name: venue.name.filter(|name| !name.is_empty())?,
                    city: venue.city,
                    country: venue.country,
                })
            }),
            headline: raw
                .headline
                .and_then(|performer| performer.name)
                .filter(|name| !name.is_empty())
                .map(|name| Performer { name }),
            image: raw.image.as_ref().map(AssetRef::from),
            tickets: raw.tickets.and_then(|link| Url::parse(&link).ok()),
        })
    }
}

/// Turn raw rows into the ordered batch handed to the cache.
///
/// Rows that cannot form a record are skipped, rows not strictly after `now`
/// are dropped, the rest are ordered by start time and cut to `limit`.
pub fn shape_events(rows: Vec<Value>, now: OffsetDateTime, limit: usize) -> Vec<EventRecord> {
    let mut events: Vec<EventRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let raw = match serde_json::from_value::<RawEvent>(row) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(index, error = %err, "skipping undecodable event row");
                    return None;
                }
            };
            let id = raw.id.clone();
            let record = EventRecord::from_raw(raw);
            if record.is_none() {
                warn!(index, id = ?id, "skipping event row without id or start time");
            }
            record
        })
        .filter(|event| event.starts_at > now)
        .collect();

    events.sort_by_key(|event| event.starts_at);
    events.truncate(limit);
    events
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2030-01-01 00:00 UTC);

    #[test]
    fn shapes_complete_row() {
        let rows = vec![json!({
            "_id": "evt-1",
            "name": "Night Market",
            "slug": { "current": "night-market" },
            "date": "2030-05-01T19:00:00Z",
            "doorsOpen": 18,
            "venue": { "name": "Hall", "city": "Oslo", "country": "Norway" },
            "headline": { "name": "The Band" },
            "image": { "asset": { "_ref": "image-abc" } },
            "tickets": "https://tickets.example.com/1"
        })];

        let events = shape_events(rows, NOW, 10);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.slug, "night-market");
        assert_eq!(event.doors_open.map(DoorsOpen::hour), Some(18));
        assert_eq!(
            event.venue.as_ref().map(Venue::display_line).as_deref(),
            Some("Hall, Oslo, Norway")
        );
        assert_eq!(event.headline.as_ref().map(|h| h.name.as_str()), Some("The Band"));
        assert_eq!(event.image.as_ref().map(AssetRef::as_str), Some("image-abc"));
        assert_eq!(
            event.tickets.as_ref().map(Url::as_str),
            Some("https://tickets.example.com/1")
        );
    }

    #[test]
    fn missing_and_malformed_optionals_are_absent() {
        let rows = vec![json!({
            "_id": "evt-2",
            "date": "2030-02-01T10:00:00+02:00",
            "doorsOpen": 31,
            "venue": { "city": "Oslo" },
            "headline": { "name": "" },
            "tickets": "not a url"
        })];

        let events = shape_events(rows, NOW, 10);
        let event = &events[0];
        assert_eq!(event.name, "");
        assert!(event.doors_open.is_none());
        assert!(event.venue.is_none());
        assert!(event.headline.is_none());
        assert!(event.image.is_none());
        assert!(event.tickets.is_none());
    }

    #[test]
    fn rows_without_id_or_date_are_skipped() {
        let rows = vec![
            json!({ "name": "no id", "date": "2030-02-01T10:00:00Z" }),
            json!({ "_id": "bad-date", "date": "next tuesday" }),
            json!("not an object"),
            json!({ "_id": "ok", "date": "2030-02-01T10:00:00Z" }),
        ];

        let events = shape_events(rows, NOW, 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "ok");
    }

    #[test]
    fn batch_is_future_only_sorted_and_windowed() {
        let rows: Vec<Value> = [
            ("past", "2029-12-31T23:59:59Z"),
            ("exactly-now", "2030-01-01T00:00:00Z"),
            ("c", "2030-03-01T00:00:00Z"),
            ("a", "2030-01-02T00:00:00Z"),
            ("b", "2030-02-01T00:00:00Z"),
        ]
        .into_iter()
        .map(|(id, date)| json!({ "_id": id, "date": date }))
        .collect();

        let events = shape_events(rows, NOW, 2);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn doors_open_bounds() {
        assert_eq!(DoorsOpen::new(0).map(DoorsOpen::hour), Some(0));
        assert_eq!(DoorsOpen::new(23).map(DoorsOpen::hour), Some(23));
        assert!(DoorsOpen::new(24).is_none());
        assert!(DoorsOpen::new(-1).is_none());
    }

    #[test]
    fn venue_line_skips_missing_parts() {
        let venue = Venue {
            name: "Hall".to_string(),
            city: None,
            country: Some("Norway".to_string()),
        };
        assert_eq!(venue.display_line(), "Hall, Norway");
    }
}
