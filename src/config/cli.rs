use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::assets::CARD_IMAGE;

/// Command-line arguments for the marquee binary.
#[derive(Debug, Parser)]
#[command(
    name = "marquee",
    version,
    about = "Upcoming events from a hosted content store"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "MARQUEE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List the next upcoming events.
    Events(EventsArgs),
    /// Print the CDN URL for an image asset reference.
    #[command(name = "image-url")]
    ImageUrl(ImageUrlArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct EventsArgs {
    /// Print the listing as JSON instead of text.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ImageUrlArgs {
    /// Asset reference as returned by the content store (e.g. `image-abc-600x400-jpg`).
    #[arg(value_name = "ASSET_REF")]
    pub asset: String,

    /// Target width in pixels.
    #[arg(long, default_value_t = CARD_IMAGE.width)]
    pub width: u32,

    /// Target height in pixels.
    #[arg(long, default_value_t = CARD_IMAGE.height)]
    pub height: u32,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the content store project id.
    #[arg(
        long = "project-id",
        env = "SANITY_PROJECT_ID",
        value_name = "ID",
        global = true
    )]
    pub project_id: Option<String>,

    /// Override the content store dataset.
    #[arg(long = "dataset", env = "SANITY_DATASET", value_name = "NAME", global = true)]
    pub dataset: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}
