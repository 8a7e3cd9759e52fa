//! Formatter and image style configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML value and the user's file is layered on top, so a
//! config only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! base_url = "/files"         # Public URL prefix of the files directory
//! public_dir = "files"        # Files directory on disk (sources + derivatives)
//!
//! [formatter]
//! variant = "image"           # "image" (file items) or "media" (media items)
//! image_style_default = ""    # Empty = original image
//! image_style_thumbnail = ""
//! image_style_fullscreen = ""
//! gallery_style = "slider"    # slider | grid | animated-grid | single-image
//! image_link = ""             # Accepted, currently unused
//!
//! [page]                      # Standalone preview page (`render --page`)
//! scripts = ["…/jquery.min.js", "…/lightslider.min.js", "…/lightgallery.min.js"]
//! stylesheets = ["…/lightslider.min.css", "…/lightgallery.min.css"]
//!
//! [styles.medium]
//! effect = "scale"            # "scale" or "scale_and_crop"
//! width = 220
//! height = 220
//! upscale = false
//! quality = 90
//! ```
//!
//! ## Formatter Variants
//!
//! The two variants have different stock defaults. With `variant = "media"`
//! the default styles become `medium` / `gallery_thumbnail` / `gallery_hd`
//! and the gallery style becomes `grid`. Whatever the user file sets is
//! still layered on top.
//!
//! ## Image Styles
//!
//! Stock styles (`thumbnail`, `medium`, `large`, `gallery_thumbnail`,
//! `gallery_hd`) are always present and can be adjusted key by key. New
//! styles are added by declaring another `[styles.<name>]` table. Style names
//! become directory names under `styles/`, so they are restricted to
//! lowercase letters, digits, `_` and `-`.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    OutputFormat, Quality, ResizeMode, Sharpening, calculate_crop_dimensions,
    calculate_scale_dimensions,
};
use crate::style::GalleryStyle;
use crate::types::StyleName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where files live and how they are addressed publicly.
    pub site: SiteSettings,
    /// Formatter settings for the field being rendered.
    pub formatter: FormatterConfig,
    /// Widget libraries loaded by the standalone preview page.
    pub page: PageConfig,
    /// Image style registry.
    pub styles: BTreeMap<String, ImageStyle>,
}

impl SiteConfig {
    /// Stock configuration for a formatter variant, including stock styles.
    pub fn stock(variant: FormatterVariant) -> Self {
        Self {
            site: SiteSettings::default(),
            formatter: FormatterConfig::defaults_for(variant),
            page: PageConfig::default(),
            styles: stock_styles(),
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.base_url must not be empty".into(),
            ));
        }
        if self.site.public_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.public_dir must not be empty".into(),
            ));
        }
        if self
            .page
            .scripts
            .iter()
            .chain(&self.page.stylesheets)
            .any(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "page scripts and stylesheets must not be empty".into(),
            ));
        }
        for (name, style) in &self.styles {
            if !is_valid_style_name(name) {
                return Err(ConfigError::Validation(format!(
                    "style name '{name}' may only contain a-z, 0-9, '_' and '-'"
                )));
            }
            style
                .validate()
                .map_err(|msg| ConfigError::Validation(format!("styles.{name}: {msg}")))?;
        }
        Ok(())
    }

    /// Look up a style definition by name.
    pub fn style(&self, name: &StyleName) -> Option<&ImageStyle> {
        self.styles.get(name.as_str())
    }

    /// Options for the image style selects, as `(key, label)` pairs.
    ///
    /// The first entry is the empty key meaning "use the original image".
    pub fn image_style_options(&self) -> Vec<(String, String)> {
        let mut options = vec![(String::new(), "None (original image)".to_string())];
        options.extend(
            self.styles
                .iter()
                .map(|(name, style)| (name.clone(), style.display_label(name))),
        );
        options
    }

    /// One-line-per-setting summary shown next to the formatter.
    ///
    /// The default image style is reported only when it still exists in the
    /// registry; a style that went missing reads as "Original image".
    pub fn settings_summary(&self) -> Vec<String> {
        let mut summary = Vec::new();
        match StyleName::from_setting(&self.formatter.image_style_default) {
            Some(name) if self.style(&name).is_some() => {
                summary.push(format!("Image style: {}", name));
            }
            _ => summary.push("Original image".to_string()),
        }
        summary.push(format!(
            "Gallery style: {}",
            self.formatter.gallery_style.label()
        ));
        summary
    }
}

fn is_valid_style_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Location settings for source files and derivatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    /// Public URL prefix that maps onto `public_dir`.
    pub base_url: String,
    /// Directory holding source images and the `styles/` derivative tree.
    pub public_dir: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "/files".to_string(),
            public_dir: "files".to_string(),
        }
    }
}

/// Assets the standalone preview page loads ahead of the client script.
///
/// The client script drives jQuery plugins, so `scripts` must provide
/// jQuery followed by the lightSlider and lightGallery plugins, in that
/// order. Gallery fragments embedded elsewhere ignore this section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            scripts: vec![
                "https://code.jquery.com/jquery-3.7.1.min.js".to_string(),
                "https://cdn.jsdelivr.net/npm/lightslider@1.1.6/dist/js/lightslider.min.js"
                    .to_string(),
                "https://cdn.jsdelivr.net/npm/lightgallery@1.10.0/dist/js/lightgallery.min.js"
                    .to_string(),
            ],
            stylesheets: vec![
                "https://cdn.jsdelivr.net/npm/lightslider@1.1.6/dist/css/lightslider.min.css"
                    .to_string(),
                "https://cdn.jsdelivr.net/npm/lightgallery@1.10.0/dist/css/lightgallery.min.css"
                    .to_string(),
            ],
        }
    }
}

/// Which kind of field items the formatter receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterVariant {
    /// Items reference image files directly.
    #[default]
    Image,
    /// Items reference media entities that carry an image file.
    Media,
}

/// Per-field formatter settings.
///
/// Style names are plain strings because an empty value is meaningful: it
/// selects the original image for that role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    pub variant: FormatterVariant,
    pub image_style_default: String,
    pub image_style_thumbnail: String,
    pub image_style_fullscreen: String,
    pub gallery_style: GalleryStyle,
    /// Link target setting; accepted for compatibility, not used.
    pub image_link: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self::defaults_for(FormatterVariant::Image)
    }
}

impl FormatterConfig {
    pub fn defaults_for(variant: FormatterVariant) -> Self {
        match variant {
            FormatterVariant::Image => Self {
                variant,
                image_style_default: String::new(),
                image_style_thumbnail: String::new(),
                image_style_fullscreen: String::new(),
                gallery_style: GalleryStyle::Slider,
                image_link: String::new(),
            },
            FormatterVariant::Media => Self {
                variant,
                image_style_default: "medium".to_string(),
                image_style_thumbnail: "gallery_thumbnail".to_string(),
                image_style_fullscreen: "gallery_hd".to_string(),
                gallery_style: GalleryStyle::Grid,
                image_link: String::new(),
            },
        }
    }

    /// Configured style names for the three roles.
    pub fn style_names(&self) -> RoleStyles {
        RoleStyles {
            default: StyleName::from_setting(&self.image_style_default),
            thumbnail: StyleName::from_setting(&self.image_style_thumbnail),
            fullscreen: StyleName::from_setting(&self.image_style_fullscreen),
        }
    }
}

/// Style selection per role; `None` means the original image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleStyles {
    pub default: Option<StyleName>,
    pub thumbnail: Option<StyleName>,
    pub fullscreen: Option<StyleName>,
}

/// Transformation applied by an image style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleEffect {
    /// Fit inside the box, keeping the aspect ratio.
    #[default]
    Scale,
    /// Cover the box exactly and crop the overflow.
    ScaleAndCrop,
}

/// A named image transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub effect: StyleEffect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub upscale: bool,
    /// Encoding quality for lossy formats (1-100).
    pub quality: u32,
    /// Apply a light unsharp mask after resizing.
    pub sharpen: bool,
    /// Convert derivatives to this format instead of keeping the source's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<OutputFormat>,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            label: None,
            effect: StyleEffect::Scale,
            width: None,
            height: None,
            upscale: false,
            quality: 90,
            sharpen: false,
            convert: None,
        }
    }
}

impl ImageStyle {
    pub fn scale(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn scale_and_crop(width: u32, height: u32) -> Self {
        Self {
            effect: StyleEffect::ScaleAndCrop,
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.quality) {
            return Err("quality must be 1-100".into());
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err("width and height must be non-zero".into());
        }
        if self.effect == StyleEffect::ScaleAndCrop
            && (self.width.is_none() || self.height.is_none())
        {
            return Err("scale_and_crop needs both width and height".into());
        }
        Ok(())
    }

    fn display_label(&self, name: &str) -> String {
        self.label.clone().unwrap_or_else(|| name.to_string())
    }

    /// Dimensions a derivative of a `source`-sized image will have.
    pub fn derivative_dimensions(&self, source: (u32, u32)) -> (u32, u32) {
        match self.effect {
            StyleEffect::Scale => {
                calculate_scale_dimensions(source, self.width, self.height, self.upscale)
            }
            StyleEffect::ScaleAndCrop => calculate_crop_dimensions(
                self.width.unwrap_or(source.0),
                self.height.unwrap_or(source.1),
            ),
        }
    }

    pub fn resize_mode(&self) -> ResizeMode {
        match self.effect {
            StyleEffect::Scale => ResizeMode::Fit,
            StyleEffect::ScaleAndCrop => ResizeMode::Fill,
        }
    }

    pub fn encoding_quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    pub fn sharpening(&self) -> Option<Sharpening> {
        self.sharpen.then(Sharpening::light)
    }
}

/// The image styles every installation starts with.
pub fn stock_styles() -> BTreeMap<String, ImageStyle> {
    let mut styles = BTreeMap::new();
    styles.insert(
        "thumbnail".to_string(),
        ImageStyle {
            label: Some("Thumbnail (100×100)".to_string()),
            ..ImageStyle::scale(100, 100)
        },
    );
    styles.insert(
        "medium".to_string(),
        ImageStyle {
            label: Some("Medium (220×220)".to_string()),
            ..ImageStyle::scale(220, 220)
        },
    );
    styles.insert(
        "large".to_string(),
        ImageStyle {
            label: Some("Large (480×480)".to_string()),
            ..ImageStyle::scale(480, 480)
        },
    );
    styles.insert(
        "gallery_thumbnail".to_string(),
        ImageStyle {
            label: Some("Gallery thumbnail (120×120 crop)".to_string()),
            sharpen: true,
            ..ImageStyle::scale_and_crop(120, 120)
        },
    );
    styles.insert(
        "gallery_hd".to_string(),
        ImageStyle {
            label: Some("Gallery HD (1920×1920)".to_string()),
            ..ImageStyle::scale(1920, 1920)
        },
    );
    styles
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock config for a variant as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value(variant: FormatterVariant) -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::stock(variant))?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Variant named by a raw overlay, if it names a valid one.
fn overlay_variant(overlay: Option<&toml::Value>) -> FormatterVariant {
    overlay
        .and_then(|v| v.get("formatter"))
        .and_then(|f| f.get("variant"))
        .cloned()
        .and_then(|v| v.try_into().ok())
        .unwrap_or_default()
}

/// Merge an optional overlay onto the variant's stock defaults, then
/// deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value(overlay_variant(overlay.as_ref()))?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# slide-gal configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults for the "image" formatter variant.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[site]
# Public URL prefix that maps onto public_dir.
base_url = "/files"

# Directory holding source images. Derivatives are written below
# <public_dir>/styles/<style>/public/.
public_dir = "files"

# ---------------------------------------------------------------------------
# Formatter
# ---------------------------------------------------------------------------
[formatter]
# "image": field items are image files.
# "media": field items are media entities; defaults switch to
#          medium / gallery_thumbnail / gallery_hd and gallery_style = "grid".
variant = "image"

# Image style per role. Empty = None (original image).
image_style_default = ""
image_style_thumbnail = ""
image_style_fullscreen = ""

# slider | grid | animated-grid | single-image (unknown values mean grid).
gallery_style = "slider"

# Accepted for compatibility; not used.
image_link = ""

# ---------------------------------------------------------------------------
# Preview page
# ---------------------------------------------------------------------------
# Loaded by `render --page` before the client script: jQuery first, then
# the lightSlider and lightGallery plugins. Point these at local copies to
# preview offline.
[page]
scripts = [
    "https://code.jquery.com/jquery-3.7.1.min.js",
    "https://cdn.jsdelivr.net/npm/lightslider@1.1.6/dist/js/lightslider.min.js",
    "https://cdn.jsdelivr.net/npm/lightgallery@1.10.0/dist/js/lightgallery.min.js",
]
stylesheets = [
    "https://cdn.jsdelivr.net/npm/lightslider@1.1.6/dist/css/lightslider.min.css",
    "https://cdn.jsdelivr.net/npm/lightgallery@1.10.0/dist/css/lightgallery.min.css",
]

# ---------------------------------------------------------------------------
# Image styles
# ---------------------------------------------------------------------------
# effect = "scale": fit inside width x height, keep aspect ratio.
# effect = "scale_and_crop": cover width x height exactly, crop the overflow.
# upscale: allow enlarging sources smaller than the box (scale only).
# quality: 1-100, used by JPEG.  sharpen: light unsharp mask.
# convert: optional output format ("jpeg", "png", "gif", "webp").

[styles.thumbnail]
label = "Thumbnail (100×100)"
effect = "scale"
width = 100
height = 100

[styles.medium]
label = "Medium (220×220)"
effect = "scale"
width = 220
height = 220

[styles.large]
label = "Large (480×480)"
effect = "scale"
width = 480
height = 480

[styles.gallery_thumbnail]
label = "Gallery thumbnail (120×120 crop)"
effect = "scale_and_crop"
width = 120
height = 120
sharpen = true

[styles.gallery_hd]
label = "Gallery HD (1920×1920)"
effect = "scale"
width = 1920
height = 1920
"##
}
