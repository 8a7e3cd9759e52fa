//! Field values handed to the formatter.
//!
//! A field value is read from a JSON document:
//!
//! ```json
//! {
//!   "entity_id": 12,
//!   "field_name": "field_gallery",
//!   "items": [
//!     { "file": "public://photos/dawn.jpg" },
//!     { "media": 7, "image": "public://photos/dusk.jpg" },
//!     { "media": 8, "image": null }
//!   ]
//! }
//! ```
//!
//! `file` items come from image fields, `media` items from media reference
//! fields. A media item whose image is `null` lost its source file and
//! renders with no variants.

use crate::types::ImageReference;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid field JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldValue {
    /// Id of the entity holding the field: decimal digits, given as a number
    /// or a string and kept as text. Container ids rely on it having no `-`.
    #[serde(deserialize_with = "numeric_id")]
    pub entity_id: String,
    /// Field machine name, e.g. `field_gallery`.
    pub field_name: String,
    #[serde(default)]
    pub items: Vec<FieldItem>,
}

impl FieldValue {
    pub fn load(path: &Path) -> Result<Self, FieldError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Source image of every item, in field order.
    pub fn images(&self) -> Vec<Option<ImageReference>> {
        self.items.iter().map(|item| item.image().cloned()).collect()
    }
}

/// One field item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldItem {
    /// Media entity referencing an image file.
    Media {
        #[serde(deserialize_with = "id_from_string_or_number")]
        media: String,
        image: Option<ImageReference>,
    },
    /// Image file referenced directly.
    File { file: ImageReference },
}

impl FieldItem {
    pub fn image(&self) -> Option<&ImageReference> {
        match self {
            Self::Media { image, .. } => image.as_ref(),
            Self::File { file } => Some(file),
        }
    }
}

fn id_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

fn numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = id_from_string_or_number(deserializer)?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(serde::de::Error::custom(format!(
            "entity_id must be decimal digits, got '{id}'"
        )));
    }
    Ok(id)
}
