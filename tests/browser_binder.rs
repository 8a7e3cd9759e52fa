//! Browser binder tests: runs the shipped client script in headless Chrome.
//!
//! The page is produced by `render_page` with stub jQuery plugins standing
//! in for lightSlider and lightGallery. The stubs record every widget
//! construction in `window.inits` so the options can be inspected.
//!
//! Run with: `cargo test --test browser_binder -- --ignored`

use headless_chrome::{Browser, LaunchOptions, Tab};
use slide_gal::binder::{PROCESSED_MARKER, client_script};
use slide_gal::config::PageConfig;
use slide_gal::gallery::{
    Attachments, CacheDirective, ContainerId, GalleryImage, GalleryViewModel, LIBRARY,
};
use slide_gal::render::render_page;
use slide_gal::style::GalleryStyle;
use slide_gal::types::{ImageReference, ImageVariant};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

const SLIDER: &str = "lightSlideGallery-1-field-slider";
const SINGLE: &str = "lightSlideGallery-2-field-single";
const GRID: &str = "lightSlideGallery-3-field-grid";

/// Drupal behaviors registry, so the script registers instead of
/// attaching on load and the tests decide when to attach.
const DRUPAL_STUB: &str = "window.Drupal = { behaviors: {} };\n";

/// Minimal jQuery with recording lightSlider / lightGallery plugins.
const JQUERY_STUB: &str = r#"
window.inits = [];
(function () {
  function Wrap(els) { this.els = els; }
  Wrap.prototype.children = function (sel) {
    var out = [];
    this.els.forEach(function (el) {
      Array.prototype.forEach.call(el.children, function (c) {
        if (c.matches(sel)) { out.push(c); }
      });
    });
    return new Wrap(out);
  };
  Wrap.prototype.first = function () { return new Wrap(this.els.slice(0, 1)); };
  Wrap.prototype.lightSlider = function (opts) {
    this.els.forEach(function (el) {
      window.inits.push({ widget: 'slider', id: el.parentNode.id,
                          options: JSON.parse(JSON.stringify(opts)) });
    });
    if (opts.onSliderLoad) { opts.onSliderLoad(this); }
    return this;
  };
  Wrap.prototype.lightGallery = function (opts) {
    this.els.forEach(function (el) {
      window.inits.push({ widget: 'lightbox', id: el.id || el.parentNode.id,
                          options: JSON.parse(JSON.stringify(opts)) });
    });
    return this;
  };
  window.jQuery = window.$ = function (el) { return new Wrap([el]); };
  window.jQuery.fn = Wrap.prototype;
})();
"#;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn browser() -> &'static Browser {
    static B: OnceLock<Browser> = OnceLock::new();
    B.get_or_init(|| {
        Browser::new(LaunchOptions {
            window_size: Some((1280, 800)),
            ..Default::default()
        })
        .expect("failed to launch Chrome")
    })
}

fn gallery(entity: &str, field: &str, style: GalleryStyle) -> GalleryViewModel {
    let variant = |name: &str| ImageVariant {
        url: format!("{name}.jpg"),
        uri: format!("public://{name}.jpg"),
        file_size: 1,
        file_size_formatted: "1 bytes".to_string(),
        width: 10,
        height: 10,
    };
    GalleryViewModel {
        container_id: ContainerId::new(entity, field),
        gallery_style: style,
        images: vec![GalleryImage {
            source: Some(ImageReference::new("a.jpg")),
            default: Some(variant("default")),
            thumbnail: Some(variant("thumb")),
            fullscreen: Some(variant("full")),
        }],
        attachments: Attachments {
            libraries: vec![LIBRARY.to_string()],
        },
        cache: CacheDirective::UNCACHEABLE,
    }
}

/// Write a preview page with a slider, a single-image and a grid gallery.
///
/// Without `with_plugins` only the Drupal stub is loaded, as on a page
/// whose widget libraries failed to load.
fn load_page(with_plugins: bool) -> (TempDir, Arc<Tab>) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("drupal.js"), DRUPAL_STUB).unwrap();
    std::fs::write(dir.path().join("jquery.js"), JQUERY_STUB).unwrap();

    let mut scripts = vec!["drupal.js".to_string()];
    if with_plugins {
        scripts.push("jquery.js".to_string());
    }
    let page = PageConfig {
        scripts,
        stylesheets: vec![],
    };
    let galleries = [
        gallery("1", "field_slider", GalleryStyle::Slider),
        gallery("2", "field_single", GalleryStyle::SingleImage),
        gallery("3", "field_grid", GalleryStyle::Grid),
    ];
    let html = render_page(&galleries, "Binder", &page, &client_script().unwrap()).into_string();
    let file = dir.path().join("index.html");
    std::fs::write(&file, html).unwrap();

    let tab = browser().new_tab().unwrap();
    tab.navigate_to(&format!("file://{}", file.display()))
        .unwrap()
        .wait_until_navigated()
        .unwrap();
    (dir, tab)
}

fn eval_json(tab: &Tab, expr: &str) -> serde_json::Value {
    let result = tab
        .evaluate(&format!("JSON.stringify({expr})"), false)
        .unwrap();
    serde_json::from_str(result.value.unwrap().as_str().unwrap()).unwrap()
}

fn attach(tab: &Tab) {
    tab.evaluate(
        "Drupal.behaviors.lightSlideGallery.attach(document); true",
        false,
    )
    .unwrap();
}

fn inits(tab: &Tab) -> Vec<serde_json::Value> {
    eval_json(tab, "window.inits || []")
        .as_array()
        .unwrap()
        .clone()
}

fn inits_for<'a>(all: &'a [serde_json::Value], id: &str) -> Vec<&'a serde_json::Value> {
    all.iter().filter(|i| i["id"] == id).collect()
}

fn is_marked(tab: &Tab, id: &str) -> bool {
    eval_json(
        tab,
        &format!("document.getElementById('{id}').hasAttribute('{PROCESSED_MARKER}')"),
    )
    .as_bool()
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn each_container_initialized_once_across_attaches() {
    let (_dir, tab) = load_page(true);
    attach(&tab);
    attach(&tab);

    let all = inits(&tab);
    // Slider: slider plus the lightbox opened from it
    assert_eq!(inits_for(&all, SLIDER).len(), 2, "{all:?}");
    assert_eq!(inits_for(&all, SINGLE).len(), 1, "{all:?}");
    assert_eq!(inits_for(&all, GRID).len(), 1, "{all:?}");
    for id in [SLIDER, SINGLE, GRID] {
        assert!(is_marked(&tab, id), "{id} not marked");
    }
}

#[test]
#[ignore]
fn slider_gets_paged_options_and_scoped_lightbox() {
    let (_dir, tab) = load_page(true);
    attach(&tab);

    let all = inits(&tab);
    let slider = inits_for(&all, SLIDER)
        .into_iter()
        .find(|i| i["widget"] == "slider")
        .unwrap();
    assert_eq!(slider["options"]["thumbItem"], 9);
    assert_eq!(slider["options"]["enableDrag"], false);
    assert_eq!(slider["options"]["loop"], true);

    let lightbox = inits_for(&all, SLIDER)
        .into_iter()
        .find(|i| i["widget"] == "lightbox")
        .unwrap();
    assert_eq!(
        lightbox["options"]["selector"],
        format!("#{SLIDER} .lslide")
    );
}

#[test]
#[ignore]
fn single_image_lightbox_has_no_chrome() {
    let (_dir, tab) = load_page(true);
    attach(&tab);

    let all = inits(&tab);
    let single = inits_for(&all, SINGLE);
    assert_eq!(single[0]["widget"], "lightbox");
    let options = &single[0]["options"];
    assert_eq!(options["counter"], false);
    assert_eq!(options["controls"], false);
    assert_eq!(options["loop"], false);
    assert_eq!(options["thumbnail"], false);
}

#[test]
#[ignore]
fn unknown_style_falls_back_to_grid() {
    let (_dir, tab) = load_page(true);
    tab.evaluate(
        &format!("document.getElementById('{GRID}').setAttribute('data-gallery-style', 'carousel'); true"),
        false,
    )
    .unwrap();
    attach(&tab);

    let all = inits(&tab);
    let grid = inits_for(&all, GRID);
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0]["widget"], "lightbox");
    assert_eq!(grid[0]["options"]["thumbnail"], true);
    assert_eq!(grid[0]["options"]["counter"], true);
}

#[test]
#[ignore]
fn missing_plugins_leave_containers_for_a_later_attach() {
    let (_dir, tab) = load_page(false);
    attach(&tab);
    for id in [SLIDER, SINGLE, GRID] {
        assert!(!is_marked(&tab, id), "{id} marked without a widget");
    }

    // Plugins arrive late, e.g. from an aggregated bundle
    tab.evaluate(&format!("{JQUERY_STUB}; true"), false).unwrap();
    attach(&tab);

    let all = inits(&tab);
    for id in [SLIDER, SINGLE, GRID] {
        assert!(is_marked(&tab, id), "{id} not initialized on retry");
        assert!(!inits_for(&all, id).is_empty());
    }
}
