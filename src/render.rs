//! HTML rendering of gallery view models with Maud.
//!
//! The gallery fragment is what a host page embeds:
//!
//! ```html
//! <div id="lightSlideGallery-12-gallery" class="light-slide-gallery" data-gallery-style="slider">
//!   <ul class="light-slide-gallery__list">
//!     <li class="lslide" data-src="…fullscreen…" data-thumb="…thumbnail…">
//!       <img src="…default…" width="220" height="165" alt="">
//!     </li>
//!   </ul>
//! </div>
//! ```
//!
//! `data-src` is what the lightbox opens and `data-thumb` feeds the pager
//! strip; both fall back to the default rendition. Items with no usable
//! rendition are left out, and an empty view model renders nothing at all.
//!
//! [`render_page`] wraps one or more fragments in a standalone document for
//! previewing. When any gallery needs the client library, the page loads
//! the configured widget libraries (jQuery, lightSlider, lightGallery) and
//! then inlines the client script, so the widgets actually start.

use crate::config::PageConfig;
use crate::gallery::{GalleryImage, GalleryViewModel};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render the gallery fragment. Empty view models produce empty markup.
pub fn render_gallery(vm: &GalleryViewModel) -> Markup {
    if vm.is_empty() {
        return html! {};
    }
    html! {
        div.light-slide-gallery id=(vm.container_id.as_str()) data-gallery-style=(vm.gallery_style.as_str()) {
            ul.light-slide-gallery__list {
                @for image in &vm.images {
                    (render_slide(image))
                }
            }
        }
    }
}

fn render_slide(image: &GalleryImage) -> Markup {
    let Some(inline) = image.inline() else {
        return html! {};
    };
    let full = image.lightbox().map(|v| v.url.as_str());
    let thumb = image.pager().map(|v| v.url.as_str());
    html! {
        li.lslide data-src=[full] data-thumb=[thumb] {
            img src=(inline.url) width=(inline.width) height=(inline.height) alt="";
        }
    }
}

/// Render a standalone HTML document around the galleries.
///
/// Widget libraries and the client script are included only when some
/// gallery requires them. Library scripts come first, in configured order.
pub fn render_page(
    galleries: &[GalleryViewModel],
    title: &str,
    page: &PageConfig,
    script: &str,
) -> Markup {
    let needs_script = galleries
        .iter()
        .any(|vm| !vm.attachments.libraries.is_empty());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if needs_script {
                    @for href in &page.stylesheets {
                        link rel="stylesheet" href=(href);
                    }
                }
            }
            body {
                main {
                    @for vm in galleries {
                        (render_gallery(vm))
                    }
                }
                @if needs_script {
                    @for src in &page.scripts {
                        script src=(src) {}
                    }
                    script { (PreEscaped(script)) }
                }
            }
        }
    }
}

/// The view model as pretty JSON, for inspection and other renderers.
pub fn render_json(vm: &GalleryViewModel) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(vm)?)
}

/// Write rendered output to a file, creating parent directories.
pub fn write_markup(path: &Path, content: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleStyles;
    use crate::gallery::tests::FakeResolver;
    use crate::gallery::{ContainerSeed, build};
    use crate::style::GalleryStyle;
    use crate::types::{ImageReference, StyleName};
    use tempfile::TempDir;

    fn seed() -> ContainerSeed<'static> {
        ContainerSeed {
            entity_id: "12",
            field_name: "field_gallery",
        }
    }

    fn styles() -> RoleStyles {
        RoleStyles {
            default: Some(StyleName::from("medium")),
            thumbnail: Some(StyleName::from("thumbnail")),
            fullscreen: Some(StyleName::from("large")),
        }
    }

    fn view_model(uris: &[&str], resolver: &FakeResolver, style: GalleryStyle) -> GalleryViewModel {
        let images: Vec<_> = uris.iter().map(|u| Some(ImageReference::new(*u))).collect();
        build(&images, &styles(), style, seed(), resolver)
    }

    #[test]
    fn container_carries_id_and_style() {
        let vm = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::AnimatedGrid);
        let html = render_gallery(&vm).into_string();
        assert!(html.contains(r#"id="lightSlideGallery-12-field-gallery""#));
        assert!(html.contains(r#"data-gallery-style="animated-grid""#));
        assert!(html.contains(r#"class="light-slide-gallery""#));
    }

    #[test]
    fn slide_exposes_each_role() {
        let vm = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::Slider);
        let html = render_gallery(&vm).into_string();
        assert!(html.contains(r#"data-src="/files/large/a.jpg""#));
        assert!(html.contains(r#"data-thumb="/files/thumbnail/a.jpg""#));
        assert!(html.contains(r#"src="/files/medium/a.jpg""#));
        assert!(html.contains(r#"width="100""#));
        assert!(html.contains(r#"height="80""#));
    }

    #[test]
    fn slides_keep_input_order() {
        let vm = view_model(&["b.jpg", "a.jpg"], &FakeResolver::default(), GalleryStyle::Grid);
        let html = render_gallery(&vm).into_string();
        let b = html.find("/files/medium/b.jpg").unwrap();
        let a = html.find("/files/medium/a.jpg").unwrap();
        assert!(b < a);
    }

    #[test]
    fn missing_roles_fall_back_to_default() {
        let resolver = FakeResolver::failing(&[
            ("public://a.jpg", "large"),
            ("public://a.jpg", "thumbnail"),
        ]);
        let vm = view_model(&["a.jpg"], &resolver, GalleryStyle::Slider);
        let html = render_gallery(&vm).into_string();
        assert!(html.contains(r#"data-src="/files/medium/a.jpg""#));
        assert!(html.contains(r#"data-thumb="/files/medium/a.jpg""#));
    }

    #[test]
    fn unresolvable_image_is_omitted() {
        let resolver = FakeResolver::failing(&[
            ("public://a.jpg", "medium"),
            ("public://a.jpg", "thumbnail"),
            ("public://a.jpg", "large"),
        ]);
        let vm = view_model(&["a.jpg", "b.jpg"], &resolver, GalleryStyle::Grid);
        let html = render_gallery(&vm).into_string();
        assert_eq!(html.matches("<li").count(), 1);
        assert!(!html.contains("a.jpg"));
    }

    #[test]
    fn empty_view_model_renders_nothing() {
        let vm = view_model(&[], &FakeResolver::default(), GalleryStyle::Slider);
        assert_eq!(render_gallery(&vm).into_string(), "");
    }

    fn page_assets() -> PageConfig {
        PageConfig {
            scripts: vec!["vendor/jquery.js".into(), "vendor/plugins.js".into()],
            stylesheets: vec!["vendor/gallery.css".into()],
        }
    }

    #[test]
    fn page_inlines_script_only_when_required() {
        let vm = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::Slider);
        let html = render_page(&[vm], "Gallery", &page_assets(), "window.loaded = 1;")
            .into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<main><div"));
        assert!(html.contains("<script>window.loaded = 1;</script>"));

        let empty = view_model(&[], &FakeResolver::default(), GalleryStyle::Slider);
        let html = render_page(&[empty], "Gallery", &page_assets(), "window.loaded = 1;")
            .into_string();
        assert!(!html.contains("<script"));
        assert!(!html.contains("gallery.css"));
    }

    #[test]
    fn page_loads_widget_libraries_before_client_script() {
        let vm = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::Grid);
        let html = render_page(&[vm], "Gallery", &page_assets(), "window.loaded = 1;")
            .into_string();

        let jquery = html.find(r#"<script src="vendor/jquery.js"></script>"#).unwrap();
        let plugins = html.find(r#"<script src="vendor/plugins.js"></script>"#).unwrap();
        let client = html.find("<script>window.loaded").unwrap();
        assert!(jquery < plugins && plugins < client);
        assert!(html.contains(r#"<link rel="stylesheet" href="vendor/gallery.css">"#));
    }

    #[test]
    fn page_holds_several_galleries() {
        let slider = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::Slider);
        let other = build(
            &[Some(ImageReference::new("b.jpg"))],
            &styles(),
            GalleryStyle::SingleImage,
            ContainerSeed {
                entity_id: "13",
                field_name: "field_gallery",
            },
            &FakeResolver::default(),
        );
        let html = render_page(&[slider, other], "Gallery", &page_assets(), "")
            .into_string();
        assert!(html.contains(r#"id="lightSlideGallery-12-field-gallery""#));
        assert!(html.contains(r#"id="lightSlideGallery-13-field-gallery""#));
        assert_eq!(html.matches("vendor/jquery.js").count(), 1);
    }

    #[test]
    fn urls_are_escaped() {
        let vm = view_model(&["a\"b<c>.jpg"], &FakeResolver::default(), GalleryStyle::Grid);
        let html = render_gallery(&vm).into_string();
        assert!(!html.contains("a\"b<c>"));
        assert!(html.contains("a&quot;b&lt;c&gt;.jpg"));
    }

    #[test]
    fn json_carries_roles_and_directives() {
        let vm = view_model(&["a.jpg"], &FakeResolver::default(), GalleryStyle::SingleImage);
        let json: serde_json::Value = serde_json::from_str(&render_json(&vm).unwrap()).unwrap();
        assert_eq!(json["container_id"], "lightSlideGallery-12-field-gallery");
        assert_eq!(json["gallery_style"], "single-image");
        assert_eq!(json["cache"]["max_age"], 0);
        assert_eq!(json["images"][0]["thumbnail"]["url"], "/files/thumbnail/a.jpg");
        assert_eq!(json["images"][0]["source"], "public://a.jpg");
    }

    #[test]
    fn write_markup_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/nested/gallery.html");
        write_markup(&path, &html! { p { "hi" } }.into_string()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }
}
