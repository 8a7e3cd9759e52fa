//! Gallery presentation styles.
//!
//! A field instance renders its images in one of four modes. The wire
//! spelling (used in config files, the `data-gallery-style` attribute, and
//! the client script) is kebab-case:
//!
//! | Style | Wire value | Label |
//! |---|---|---|
//! | [`GalleryStyle::Slider`] | `slider` | Slider |
//! | [`GalleryStyle::Grid`] | `grid` | Grid |
//! | [`GalleryStyle::AnimatedGrid`] | `animated-grid` | Animated Grid |
//! | [`GalleryStyle::SingleImage`] | `single-image` | Single Image |
//!
//! Parsing is lenient: underscore spellings stored by older configurations
//! (`animated_grid`, `single_image`) are accepted, and anything unrecognized
//! falls back to [`GalleryStyle::Grid`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GalleryStyle {
    Slider,
    #[default]
    Grid,
    AnimatedGrid,
    SingleImage,
}

impl GalleryStyle {
    /// Every style, in the order offered by the settings form.
    pub const ALL: [GalleryStyle; 4] = [
        GalleryStyle::Slider,
        GalleryStyle::Grid,
        GalleryStyle::AnimatedGrid,
        GalleryStyle::SingleImage,
    ];

    /// Parse a configured or attribute value, falling back to `Grid`.
    pub fn parse_lenient(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Strict parse: `None` for anything that is not a known style.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "slider" => Some(Self::Slider),
            "grid" => Some(Self::Grid),
            "animated-grid" => Some(Self::AnimatedGrid),
            "single-image" => Some(Self::SingleImage),
            _ => None,
        }
    }

    /// Wire value used in markup and config.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slider => "slider",
            Self::Grid => "grid",
            Self::AnimatedGrid => "animated-grid",
            Self::SingleImage => "single-image",
        }
    }

    /// Human label shown in settings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Slider => "Slider",
            Self::Grid => "Grid",
            Self::AnimatedGrid => "Animated Grid",
            Self::SingleImage => "Single Image",
        }
    }
}

impl fmt::Display for GalleryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GalleryStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GalleryStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}
