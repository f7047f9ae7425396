//! Wire types for the hosted content store's query endpoint.
//!
//! Every projected field on [`RawEvent`] is decoded leniently: a value that is
//! missing, `null`, or of the wrong shape decodes to `None` instead of failing
//! the whole row. Interpreting the surviving values is left to the caller.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Successful query response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResponse<T> {
    pub result: T,
    /// Server-side execution time in milliseconds.
    #[serde(default)]
    pub ms: Option<u64>,
    /// The query text as echoed back by the store.
    #[serde(default)]
    pub query: Option<String>,
}

/// Error envelope returned alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: StoreError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreError {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl StoreError {
    /// Human readable summary, falling back to the error type tag.
    pub fn summary(&self) -> Option<String> {
        match (&self.description, &self.kind) {
            (Some(description), Some(kind)) => Some(format!("{kind}: {description}")),
            (Some(description), None) => Some(description.clone()),
            (None, Some(kind)) => Some(kind.clone()),
            (None, None) => None,
        }
    }
}

/// One row of the upcoming-events projection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEvent {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<SlugField>,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(rename = "doorsOpen", default, deserialize_with = "lenient")]
    pub doors_open: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub venue: Option<VenueRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub headline: Option<PerformerRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageField>,
    #[serde(default, deserialize_with = "lenient")]
    pub tickets: Option<String>,
}

/// Slugs are stored as `{ "current": "..." }`; plain strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SlugField {
    Plain(String),
    Object { current: String },
}

impl SlugField {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Object { current } => current,
        }
    }
}

/// Dereferenced venue document (`venue->{name, city, country}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VenueRef {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
}

/// Dereferenced performer document (`headline->{name}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PerformerRef {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Image field: either a bare asset id or an image object pointing at one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ImageField {
    Reference(String),
    Object { asset: AssetPointer },
}

impl ImageField {
    pub fn asset_ref(&self) -> &str {
        match self {
            Self::Reference(value) => value,
            Self::Object { asset } => &asset.reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetPointer {
    #[serde(rename = "_ref")]
    pub reference: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
