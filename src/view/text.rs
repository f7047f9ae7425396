use std::fmt::Write;

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::{assets::AssetUrlBuilder, content::EventRecord};

use super::ViewState;

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
const TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period]");

/// Plain-text rendering of the events listing.
pub fn render_text(state: &ViewState, assets: &AssetUrlBuilder) -> String {
    match state {
        ViewState::Loading => "Loading events...\n".to_string(),
        ViewState::Error { message } => format!("Error loading events: {message}\n"),
        ViewState::Empty => format!("{}\nNo upcoming events found.\n", heading(0)),
        ViewState::Populated { events } => {
            let mut out = heading(events.len());
            for event in events.iter() {
                out.push('\n');
                render_card(&mut out, event, assets);
            }
            out
        }
    }
}

fn heading(count: usize) -> String {
    format!("Upcoming Events\nDiscover the next {count} exciting events\n")
}

fn render_card(out: &mut String, event: &EventRecord, assets: &AssetUrlBuilder) {
    let _ = writeln!(out, "{}", event.name);
    if let Some(headline) = &event.headline {
        let _ = writeln!(out, "  Featuring: {}", headline.name);
    }
    let _ = writeln!(
        out,
        "  {} at {}",
        format_or_raw(event.starts_at, DATE_FORMAT),
        format_or_raw(event.starts_at, TIME_FORMAT)
    );
    if let Some(doors) = event.doors_open {
        let _ = writeln!(out, "  Doors open: {}:00", doors.hour());
    }
    if let Some(venue) = &event.venue {
        let _ = writeln!(out, "  {}", venue.display_line());
    }
    if let Some(image) = &event.image {
        let _ = writeln!(out, "  Image: {}", assets.card_url(image));
    }
    if let Some(tickets) = &event.tickets {
        let _ = writeln!(out, "  Tickets: {tickets}");
    }
}

fn format_or_raw(value: OffsetDateTime, format: &[FormatItem<'_>]) -> String {
    value.format(format).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use url::Url;

    use super::*;
    use crate::assets::AssetRef;
    use crate::content::{DoorsOpen, Performer, Venue};

    fn builder() -> AssetUrlBuilder {
        AssetUrlBuilder::new("P", "D")
    }

    #[test]
    fn loading_and_error_messages() {
        assert_eq!(render_text(&ViewState::Loading, &builder()), "Loading events...\n");
        assert_eq!(
            render_text(
                &ViewState::Error {
                    message: "status 500".to_string()
                },
                &builder()
            ),
            "Error loading events: status 500\n"
        );
    }

    #[test]
    fn empty_listing_says_so() {
        assert_eq!(
            render_text(&ViewState::Empty, &builder()),
            "Upcoming Events\nDiscover the next 0 exciting events\n\nNo upcoming events found.\n"
        );
    }

    #[test]
    fn populated_card_lists_present_fields() {
        let event = EventRecord {
            id: "evt-1".to_string(),
            name: "Night Market".to_string(),
            slug: "night-market".to_string(),
            starts_at: datetime!(2030-05-01 19:30 UTC),
            doors_open: DoorsOpen::new(18),
            venue: Some(Venue {
                name: "Hall".to_string(),
                city: Some("Oslo".to_string()),
                country: Some("Norway".to_string()),
            }),
            headline: Some(Performer {
                name: "The Band".to_string(),
            }),
            image: Some(AssetRef::new("image-abc")),
            tickets: Url::parse("https://tickets.example.com/1").ok(),
        };
        let state = ViewState::Populated {
            events: vec![event].into(),
        };

        let text = render_text(&state, &builder());
        assert_eq!(
            text,
            "Upcoming Events\n\
             Discover the next 1 exciting events\n\
             \n\
             Night Market\n  \
             Featuring: The Band\n  \
             May 1, 2030 at 7:30 PM\n  \
             Doors open: 18:00\n  \
             Hall, Oslo, Norway\n  \
             Image: https://cdn.sanity.io/images/P/D/abc?w=600&h=400\n  \
             Tickets: https://tickets.example.com/1\n"
        );
    }
}
