use std::process;

use marquee::{
    assets::{AssetRef, AssetUrlBuilder, ImageTransform},
    cache::QueryCache,
    config::{self, Command, EventsArgs, ImageUrlArgs, Settings},
    content::{ContentClient, EventRecord, FetchError},
    error::AppError,
    infra::telemetry,
    view::{UpcomingEvents, ViewState, render_text},
};
use serde::Serialize;
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(Command::Events(EventsArgs::default()));

    telemetry::init(&settings.logging)?;

    match command {
        Command::Events(args) => run_events(&settings, args).await,
        Command::ImageUrl(args) => run_image_url(&settings, args),
    }
}

async fn run_events(settings: &Settings, args: EventsArgs) -> Result<(), AppError> {
    let client = ContentClient::new(&settings.content)?;
    debug!(endpoint = %client.endpoint(), "querying content store");

    let events = UpcomingEvents::new(QueryCache::new(client));
    let state = events.load().await;
    let assets = settings.content.asset_urls();

    if args.json {
        print_json(&EventsReport::new(&state, &assets))?;
    } else {
        print!("{}", render_text(&state, &assets));
    }

    match state {
        ViewState::Error { message } => Err(FetchError::failed(message).into()),
        _ => Ok(()),
    }
}

fn run_image_url(settings: &Settings, args: ImageUrlArgs) -> Result<(), AppError> {
    let transform = ImageTransform {
        width: args.width,
        height: args.height,
    };
    let url = settings
        .content
        .asset_urls()
        .url(&AssetRef::new(args.asset), transform);
    println!("{url}");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::output(format!("failed to encode JSON: {err}")))?;
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct EventsReport<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    events: Vec<EventCard<'a>>,
}

#[derive(Serialize)]
struct EventCard<'a> {
    #[serde(flatten)]
    record: &'a EventRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl<'a> EventsReport<'a> {
    fn new(state: &'a ViewState, assets: &AssetUrlBuilder) -> Self {
        let (status, message) = match state {
            ViewState::Loading => ("loading", None),
            ViewState::Error { message } => ("error", Some(message.as_str())),
            ViewState::Empty => ("empty", None),
            ViewState::Populated { .. } => ("populated", None),
        };
        let events = state
            .events()
            .iter()
            .map(|record| EventCard {
                record,
                image_url: record.image.as_ref().map(|image| assets.card_url(image)),
            })
            .collect();

        Self {
            status,
            message,
            events,
        }
    }
}
