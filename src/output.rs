//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every listing leads with what the user cares about (the gallery, the
//! image, the rendition) and shows paths and sizes as indented context
//! lines. Files on disk are secondary.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! lightSlideGallery-12-field-gallery (slider, 2 images)
//!     001 photos/dawn.jpg
//!         default: 220×165, 45.21 KB
//!         thumbnail: 100×75, 3.1 KB
//!         fullscreen: missing
//!     002 (no image)
//! Library: light_slide_gallery/light_slide_gallery.main
//! Derivatives: 3 existing, 1 created (4 total)
//! ```
//!
//! ## Summary
//!
//! ```text
//! Image style: medium
//! Gallery style: Grid
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::ResolveStats;
use crate::config::SiteConfig;
use crate::gallery::GalleryViewModel;
use crate::style::GalleryStyle;
use crate::types::{ImageRole, ImageVariant};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}

/// One rendition as `220×165, 45.21 KB`, or `missing`.
fn variant_detail(variant: Option<&ImageVariant>) -> String {
    match variant {
        Some(v) => format!("{}×{}, {}", v.width, v.height, v.file_size_formatted),
        None => "missing".to_string(),
    }
}

// ============================================================================
// render
// ============================================================================

/// Format the outcome of a render: one entry per field item with the status
/// of each role, then the attachment and derivative totals.
pub fn format_render_output(vm: &GalleryViewModel, stats: &ResolveStats) -> Vec<String> {
    if vm.is_empty() {
        return vec!["Empty field, nothing rendered".to_string()];
    }

    let mut lines = vec![format!(
        "{} ({}, {})",
        vm.container_id,
        vm.gallery_style,
        plural(vm.images.len(), "image", "images")
    )];

    for (i, image) in vm.images.iter().enumerate() {
        match &image.source {
            Some(source) => {
                lines.push(format!(
                    "{}{} {}",
                    indent(1),
                    format_index(i + 1),
                    source.target()
                ));
                for role in ImageRole::ALL {
                    lines.push(format!(
                        "{}{}: {}",
                        indent(2),
                        role.as_str(),
                        variant_detail(image.variant(role))
                    ));
                }
            }
            None => lines.push(format!("{}{} (no image)", indent(1), format_index(i + 1))),
        }
    }

    for library in &vm.attachments.libraries {
        lines.push(format!("Library: {}", library));
    }
    lines.push(format!("Derivatives: {}", stats));
    lines
}

pub fn print_render_output(vm: &GalleryViewModel, stats: &ResolveStats) {
    for line in format_render_output(vm, stats) {
        println!("{}", line);
    }
}

// ============================================================================
// flush
// ============================================================================

pub fn format_flush_output(style: &str, removed: usize) -> Vec<String> {
    if removed == 0 {
        vec![format!("{}: no derivatives", style)]
    } else {
        vec![format!(
            "{}: flushed {}",
            style,
            plural(removed, "derivative", "derivatives")
        )]
    }
}

pub fn print_flush_output(style: &str, removed: usize) {
    for line in format_flush_output(style, removed) {
        println!("{}", line);
    }
}

// ============================================================================
// summary
// ============================================================================

/// Settings summary followed by the choices the settings accept.
pub fn format_summary_output(config: &SiteConfig) -> Vec<String> {
    let mut lines = config.settings_summary();

    lines.push(String::new());
    lines.push("Gallery styles".to_string());
    for style in GalleryStyle::ALL {
        let marker = if style == config.formatter.gallery_style {
            " *"
        } else {
            ""
        };
        lines.push(format!(
            "{}{} ({}){}",
            indent(1),
            style.label(),
            style.as_str(),
            marker
        ));
    }

    lines.push(String::new());
    lines.push("Image styles".to_string());
    for (key, label) in config.image_style_options() {
        if key.is_empty() {
            lines.push(format!("{}{}", indent(1), label));
        } else {
            lines.push(format!("{}{} ({})", indent(1), label, key));
        }
    }
    lines
}

pub fn print_summary_output(config: &SiteConfig) {
    for line in format_summary_output(config) {
        println!("{}", line);
    }
}
