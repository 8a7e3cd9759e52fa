//! Gallery view model builder.
//!
//! Turns a field value and the formatter settings into a
//! [`GalleryViewModel`]: one [`GalleryImage`] per field item, each with up to
//! three resolved renditions, plus the container id that ties the rendered
//! markup to the client-side widget.
//!
//! ```text
//! field items ──► resolve default / thumbnail / fullscreen ──► GalleryViewModel
//!                     (DerivativeResolver, ≤3 calls per item)
//! ```
//!
//! The builder never fails. A rendition that cannot be resolved is `None`
//! and the renderer falls back or omits it. An empty field produces an empty
//! view model with no library attachment, which renders as nothing.

use crate::config::{FormatterConfig, RoleStyles};
use crate::derivative::DerivativeResolver;
use crate::field::FieldValue;
use crate::style::GalleryStyle;
use crate::types::{ImageReference, ImageRole, ImageVariant, StyleName};
use serde::Serialize;
use std::fmt;

/// Prefix of every gallery container id. The client script discovers
/// containers by it.
pub const CONTAINER_PREFIX: &str = "lightSlideGallery";

/// Client library required by a non-empty gallery.
pub const LIBRARY: &str = "light_slide_gallery/light_slide_gallery.main";

/// DOM id of a gallery container: `lightSlideGallery-<entity>-<field>`.
///
/// Underscores and spaces are replaced with hyphens so the id is safe in
/// CSS selectors. Entity ids are numeric (see [`FieldValue`]), so the first
/// hyphen after the prefix always ends the entity part; field names that
/// differ only in `_` versus `-` still share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(entity_id: &str, field_name: &str) -> Self {
        let raw = format!("{}-{}-{}", CONTAINER_PREFIX, entity_id, field_name);
        Self(raw.replace(['_', ' '], "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One field item with its resolved renditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    /// Source image; `None` for a media item without a file.
    pub source: Option<ImageReference>,
    pub default: Option<ImageVariant>,
    pub thumbnail: Option<ImageVariant>,
    pub fullscreen: Option<ImageVariant>,
}

impl GalleryImage {
    pub fn variant(&self, role: ImageRole) -> Option<&ImageVariant> {
        match role {
            ImageRole::Default => self.default.as_ref(),
            ImageRole::Thumbnail => self.thumbnail.as_ref(),
            ImageRole::Fullscreen => self.fullscreen.as_ref(),
        }
    }

    /// Rendition shown inline: default, else fullscreen, else thumbnail.
    pub fn inline(&self) -> Option<&ImageVariant> {
        self.default
            .as_ref()
            .or(self.fullscreen.as_ref())
            .or(self.thumbnail.as_ref())
    }

    /// Rendition opened in the lightbox: fullscreen, else default.
    pub fn lightbox(&self) -> Option<&ImageVariant> {
        self.fullscreen.as_ref().or(self.default.as_ref())
    }

    /// Rendition for pager and lightbox thumbnails: thumbnail, else default.
    pub fn pager(&self) -> Option<&ImageVariant> {
        self.thumbnail.as_ref().or(self.default.as_ref())
    }
}

/// Script libraries the page must load for this gallery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Attachments {
    pub libraries: Vec<String>,
}

/// Caching instruction for whoever stores the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheDirective {
    pub max_age: u32,
}

impl CacheDirective {
    /// Derivatives may not exist yet and settings can change between
    /// requests, so gallery output is never reused.
    pub const UNCACHEABLE: CacheDirective = CacheDirective { max_age: 0 };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryViewModel {
    pub container_id: ContainerId,
    pub gallery_style: GalleryStyle,
    pub images: Vec<GalleryImage>,
    pub attachments: Attachments,
    pub cache: CacheDirective,
}

impl GalleryViewModel {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Identity of the field instance being rendered.
#[derive(Debug, Clone, Copy)]
pub struct ContainerSeed<'a> {
    pub entity_id: &'a str,
    pub field_name: &'a str,
}

impl<'a> From<&'a FieldValue> for ContainerSeed<'a> {
    fn from(field: &'a FieldValue) -> Self {
        Self {
            entity_id: &field.entity_id,
            field_name: &field.field_name,
        }
    }
}

/// Build the view model for a field using its formatter settings.
pub fn build_view_model(
    config: &FormatterConfig,
    field: &FieldValue,
    resolver: &dyn DerivativeResolver,
) -> GalleryViewModel {
    build(
        &field.images(),
        &config.style_names(),
        config.gallery_style,
        ContainerSeed::from(field),
        resolver,
    )
}

/// Build a view model from explicit inputs.
///
/// Every item yields exactly one entry, in input order. Roles are resolved
/// independently: an empty style setting means the original image, and a
/// role that fails stays `None` without affecting the others.
pub fn build(
    images: &[Option<ImageReference>],
    styles: &RoleStyles,
    gallery_style: GalleryStyle,
    seed: ContainerSeed<'_>,
    resolver: &dyn DerivativeResolver,
) -> GalleryViewModel {
    let container_id = ContainerId::new(seed.entity_id, seed.field_name);

    if images.is_empty() {
        return GalleryViewModel {
            container_id,
            gallery_style,
            images: Vec::new(),
            attachments: Attachments::default(),
            cache: CacheDirective::UNCACHEABLE,
        };
    }

    let images = images
        .iter()
        .map(|source| match source {
            Some(image) => GalleryImage {
                source: Some(image.clone()),
                default: resolve_role(resolver, image, styles.default.as_ref()),
                thumbnail: resolve_role(resolver, image, styles.thumbnail.as_ref()),
                fullscreen: resolve_role(resolver, image, styles.fullscreen.as_ref()),
            },
            None => GalleryImage {
                source: None,
                default: None,
                thumbnail: None,
                fullscreen: None,
            },
        })
        .collect();

    GalleryViewModel {
        container_id,
        gallery_style,
        images,
        attachments: Attachments {
            libraries: vec![LIBRARY.to_string()],
        },
        cache: CacheDirective::UNCACHEABLE,
    }
}

fn resolve_role(
    resolver: &dyn DerivativeResolver,
    image: &ImageReference,
    style: Option<&StyleName>,
) -> Option<ImageVariant> {
    match style {
        Some(style) => resolver.resolve(image, style),
        None => resolver.describe_original(image),
    }
}
