//! Image URLs for asset references returned by the content store.

use std::fmt;

use serde::{Deserialize, Serialize};

use marquee_content_types::ImageField;

const IMAGE_CDN_BASE: &str = "https://cdn.sanity.io/images";
const IMAGE_REF_PREFIX: &str = "image-";

/// Card image size used by the events listing.
pub const CARD_IMAGE: ImageTransform = ImageTransform {
    width: 600,
    height: 400,
};

/// Opaque image asset reference. Only [`image_url`] interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ImageField> for AssetRef {
    fn from(field: &ImageField) -> Self {
        Self::new(field.asset_ref())
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
}

/// Build the CDN URL for `asset` resized to `transform`.
///
/// `image-<id>-<W>x<H>-<ext>` references map to `<id>-<W>x<H>.<ext>`; any
/// other reference has its `image-` prefix dropped and is used as is. The
/// reference is not validated.
pub fn image_url(
    project_id: &str,
    dataset: &str,
    asset: &AssetRef,
    transform: ImageTransform,
) -> String {
    format!(
        "{IMAGE_CDN_BASE}/{project_id}/{dataset}/{}?w={}&h={}",
        asset_path(asset.as_str()),
        transform.width,
        transform.height
    )
}

fn asset_path(reference: &str) -> String {
    let stripped = reference
        .strip_prefix(IMAGE_REF_PREFIX)
        .unwrap_or(reference);

    let mut parts = stripped.rsplitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ext), Some(dimensions), Some(id)) if is_dimensions(dimensions) && !ext.is_empty() => {
            format!("{id}-{dimensions}.{ext}")
        }
        _ => stripped.to_string(),
    }
}

fn is_dimensions(value: &str) -> bool {
    match value.split_once('x') {
        Some((width, height)) => {
            !width.is_empty()
                && !height.is_empty()
                && width.bytes().all(|b| b.is_ascii_digit())
                && height.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Image URL builder bound to one project and dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrlBuilder {
    project_id: String,
    dataset: String,
}

impl AssetUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn url(&self, asset: &AssetRef, transform: ImageTransform) -> String {
        image_url(&self.project_id, &self.dataset, asset, transform)
    }

    pub fn card_url(&self, asset: &AssetRef) -> String {
        self.url(asset, CARD_IMAGE)
    }
}
