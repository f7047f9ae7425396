//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::assets::AssetUrlBuilder;

pub use cli::{CliArgs, Command, EventsArgs, ImageUrlArgs, SettingsOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "marquee";
const ENV_PREFIX: &str = "MARQUEE";
pub(crate) const DEFAULT_PROJECT_ID: &str = "rsvncbtu";
pub(crate) const DEFAULT_DATASET: &str = "production";
pub(crate) const DEFAULT_API_VERSION: &str = "2024-01-01";
const DEFAULT_USE_CDN: bool = true;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub content: ContentSettings,
    pub logging: LoggingSettings,
}

/// Where the content store lives and how to address it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSettings {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Replaces the project's API host, e.g. for a proxy.
    pub api_url: Option<Url>,
}

impl ContentSettings {
    /// Base URL of the query API for this project.
    pub fn api_base(&self) -> Result<Url, url::ParseError> {
        match &self.api_url {
            Some(url) => Ok(url.clone()),
            None => {
                let host = if self.use_cdn { "apicdn" } else { "api" };
                Url::parse(&format!("https://{}.{host}.sanity.io/", self.project_id))
            }
        }
    }

    /// `<api base>/v<api version>/data/query/<dataset>`.
    pub fn query_endpoint(&self) -> Result<Url, url::ParseError> {
        let mut url = self.api_base()?;
        let version = format!("v{}", self.api_version);
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([version.as_str(), "data", "query", self.dataset.as_str()]);
        Ok(url)
    }

    pub fn asset_urls(&self) -> AssetUrlBuilder {
        AssetUrlBuilder::new(&self.project_id, &self.dataset)
    }
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            use_cdn: DEFAULT_USE_CDN,
            api_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    content: RawContentSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    use_cdn: Option<bool>,
    api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(project_id) = overrides.project_id.as_ref() {
            self.content.project_id = Some(project_id.clone());
        }
        if let Some(dataset) = overrides.dataset.as_ref() {
            self.content.dataset = Some(dataset.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { content, logging } = raw;

        Ok(Self {
            content: build_content_settings(content)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let project_id = required(content.project_id, "content.project_id", DEFAULT_PROJECT_ID)?;
    if !project_id
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(LoadError::invalid(
            "content.project_id",
            "must contain only lowercase letters and digits",
        ));
    }

    let dataset = required(content.dataset, "content.dataset", DEFAULT_DATASET)?;
    if !dataset
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
    {
        return Err(LoadError::invalid(
            "content.dataset",
            "must contain only lowercase letters, digits, `_` or `-`",
        ));
    }

    let api_version = non_empty(content.api_version)
        .map(|value| value.trim_start_matches('v').to_string())
        .unwrap_or_else(|| DEFAULT_API_VERSION.into());
    if !is_api_version(&api_version) {
        return Err(LoadError::invalid(
            "content.api_version",
            format!("`{api_version}` is not `YYYY-MM-DD`, `1` or `X`"),
        ));
    }

    let api_url = non_empty(content.api_url)
        .map(|value| {
            Url::parse(&value).map_err(|err| {
                LoadError::invalid("content.api_url", format!("failed to parse: {err}"))
            })
        })
        .transpose()?;

    Ok(ContentSettings {
        project_id,
        dataset,
        api_version,
        use_cdn: content.use_cdn.unwrap_or(DEFAULT_USE_CDN),
        api_url,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

/// Falls back to `default` when unset; an explicitly empty value is an error.
fn required(
    value: Option<String>,
    key: &'static str,
    default: &str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) => {
            non_empty(Some(value)).ok_or_else(|| LoadError::invalid(key, "must not be empty"))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn is_api_version(value: &str) -> bool {
    if value == "1" || value == "X" {
        return true;
    }
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit())
}

#[cfg(test)]
mod tests;
