//! Shared types passed between the resolver, the view model builder, and
//! the renderer.
//!
//! These are serialized to JSON by the CLI (`resolve`, `render --json`) and
//! must stay stable across the three modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream wrapper scheme for files under the public files directory.
pub const PUBLIC_SCHEME: &str = "public";

/// Opaque handle to a source image, e.g. `public://photos/dawn.jpg`.
///
/// A bare relative path is taken to live in the public files directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ImageReference {
    uri: String,
}

impl ImageReference {
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.contains("://") {
            Self { uri }
        } else {
            Self {
                uri: format!("{}://{}", PUBLIC_SCHEME, uri.trim_start_matches('/')),
            }
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Scheme part of the URI (`public` for `public://a.jpg`).
    pub fn scheme(&self) -> &str {
        self.uri.split_once("://").map(|(s, _)| s).unwrap_or("")
    }

    /// Path part of the URI, relative to the scheme's root.
    pub fn target(&self) -> &str {
        self.uri.split_once("://").map(|(_, t)| t).unwrap_or(&self.uri)
    }
}

impl From<String> for ImageReference {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

impl From<ImageReference> for String {
    fn from(image: ImageReference) -> Self {
        image.uri
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Name of a configured image style, e.g. `thumbnail`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleName(String);

impl StyleName {
    /// Wrap a configured value; empty means "no style" (original image).
    pub fn from_setting(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StyleName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three renditions a gallery shows for every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    /// Inline slide / grid cell.
    Default,
    /// Pager strip and lightbox thumbnails.
    Thumbnail,
    /// Lightbox full view.
    Fullscreen,
}

impl ImageRole {
    pub const ALL: [ImageRole; 3] = [
        ImageRole::Default,
        ImageRole::Thumbnail,
        ImageRole::Fullscreen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Thumbnail => "thumbnail",
            Self::Fullscreen => "fullscreen",
        }
    }
}

/// A resolved rendition of an image: either a style derivative or the
/// original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    /// Public URL the browser loads.
    pub url: String,
    /// Internal URI (`public://styles/<style>/public/...`).
    pub uri: String,
    pub file_size: u64,
    /// Human readable size, e.g. `45.21 KB`.
    pub file_size_formatted: String,
    pub width: u32,
    pub height: u32,
}

/// Format a byte count the way file listings show it.
///
/// Below 1 KiB the count is spelled out (`1 byte`, `512 bytes`); above it
/// the value is divided by 1024 until it fits and rounded to two decimals
/// (`1.5 KB`, `45.21 KB`, `3 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    if bytes < 1024 {
        return if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", bytes)
        };
    }

    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if round2(size) >= 1024.0 {
            size /= 1024.0;
            unit = next;
        } else {
            break;
        }
    }
    format!("{} {}", round2(size), unit)
}
