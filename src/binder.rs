//! Gallery behavior binder.
//!
//! Decides which widget each gallery container gets and makes sure it gets
//! it exactly once. The browser script (`static/light-slide-gallery.js`)
//! applies these rules in the page; [`Binder`] applies them to a [`Dom`] so
//! they can be exercised and tested without one.
//!
//! # Widget table
//!
//! | Gallery style | Widget |
//! |---|---|
//! | `slider` | paged slider, lightbox opened from its slides |
//! | `grid`, `animated-grid` | lightbox with thumbnail strip |
//! | `single-image` | bare lightbox: no thumbnails, controls, counter, or looping |
//!
//! Sharing, autoplay, download, and zoom are off in every style.
//!
//! # Discovery
//!
//! An invocation receives a scope element (the document, or content that
//! was just inserted). Only containers inside both the scope and a `main`
//! element are considered, and a container is one whose id starts with
//! [`CONTAINER_PREFIX`]. Each container is marked with
//! [`PROCESSED_MARKER`] once its widget is initialized, and marked
//! containers are skipped on later invocations. A container whose widget
//! fails stays unmarked and does not stop the others.
//!
//! The option tables are serialized into the browser script by
//! [`client_script`], so the two cannot drift apart.

use crate::dom::{Dom, NodeId};
use crate::gallery::CONTAINER_PREFIX;
use crate::style::GalleryStyle;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Attribute set on a container once its widget is initialized.
pub const PROCESSED_MARKER: &str = "data-light-slide-gallery-processed";

/// Attribute holding the container's gallery style.
pub const STYLE_ATTRIBUTE: &str = "data-gallery-style";

/// Selector for slide elements inside a container.
pub const SLIDE_SELECTOR: &str = ".lslide";

const SCRIPT_TEMPLATE: &str = include_str!("../static/light-slide-gallery.js");
const PLANS_PLACEHOLDER: &str = "__WIDGET_PLANS__";

/// Options passed to the slider widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderOptions {
    pub gallery: bool,
    pub item: u32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub thumb_item: u32,
    pub slide_margin: u32,
    pub enable_drag: bool,
    pub current_pager_position: String,
}

/// Options passed to the lightbox widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightboxOptions {
    pub selector: String,
    pub thumbnail: bool,
    pub controls: bool,
    pub counter: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub share: bool,
    pub autoplay: bool,
    pub autoplay_controls: bool,
    pub download: bool,
    pub zoom: bool,
    pub actual_size: bool,
}

impl LightboxOptions {
    /// Full chrome, with every sharing and playback extra off.
    fn standard() -> Self {
        Self {
            selector: SLIDE_SELECTOR.to_string(),
            thumbnail: true,
            controls: true,
            counter: true,
            looping: true,
            share: false,
            autoplay: false,
            autoplay_controls: false,
            download: false,
            zoom: false,
            actual_size: false,
        }
    }
}

/// Widget construction for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "lowercase")]
pub enum WidgetPlan {
    /// Slider over the slide list; the lightbox is attached once it loads.
    Slider {
        slider: SliderOptions,
        lightbox: LightboxOptions,
    },
    /// Lightbox only.
    Lightbox { lightbox: LightboxOptions },
}

impl WidgetPlan {
    pub fn lightbox(&self) -> &LightboxOptions {
        match self {
            Self::Slider { lightbox, .. } | Self::Lightbox { lightbox } => lightbox,
        }
    }

    pub fn slider(&self) -> Option<&SliderOptions> {
        match self {
            Self::Slider { slider, .. } => Some(slider),
            Self::Lightbox { .. } => None,
        }
    }

    /// The plan with the lightbox selector limited to one container's slides.
    pub fn scoped_to(&self, container_id: &str) -> WidgetPlan {
        let mut plan = self.clone();
        let lightbox = match &mut plan {
            Self::Slider { lightbox, .. } | Self::Lightbox { lightbox } => lightbox,
        };
        lightbox.selector = format!("#{} {}", container_id, SLIDE_SELECTOR);
        plan
    }
}

/// The fixed options table for a gallery style.
///
/// The lightbox selector here is the bare slide selector; [`Binder::attach`]
/// and the browser script scope it to `#<id> .lslide` per container.
pub fn widget_plan(style: GalleryStyle) -> WidgetPlan {
    match style {
        GalleryStyle::Slider => WidgetPlan::Slider {
            slider: SliderOptions {
                gallery: true,
                item: 1,
                looping: true,
                thumb_item: 9,
                slide_margin: 0,
                enable_drag: false,
                current_pager_position: "left".to_string(),
            },
            lightbox: LightboxOptions::standard(),
        },
        GalleryStyle::Grid | GalleryStyle::AnimatedGrid => WidgetPlan::Lightbox {
            lightbox: LightboxOptions::standard(),
        },
        GalleryStyle::SingleImage => WidgetPlan::Lightbox {
            lightbox: LightboxOptions {
                thumbnail: false,
                controls: false,
                counter: false,
                looping: false,
                ..LightboxOptions::standard()
            },
        },
    }
}

/// Option tables for every style, keyed by wire value.
pub fn widget_plans() -> BTreeMap<&'static str, WidgetPlan> {
    GalleryStyle::ALL
        .iter()
        .map(|&style| (style.as_str(), widget_plan(style)))
        .collect()
}

/// The browser script with the option tables filled in.
pub fn client_script() -> Result<String, serde_json::Error> {
    let plans = serde_json::to_string(&widget_plans())?;
    Ok(SCRIPT_TEMPLATE.replace(PLANS_PLACEHOLDER, &plans))
}

/// A widget could not be constructed, e.g. its library is not loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot initialize {container}: {reason}")]
pub struct WidgetError {
    pub container: String,
    pub reason: String,
}

/// Receiver of widget constructions.
pub trait WidgetHost {
    fn initialize(&mut self, container_id: &str, plan: &WidgetPlan) -> Result<(), WidgetError>;
}

/// A host that just remembers what it was asked to build.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub initialized: Vec<(String, WidgetPlan)>,
}

impl WidgetHost for RecordingHost {
    fn initialize(&mut self, container_id: &str, plan: &WidgetPlan) -> Result<(), WidgetError> {
        self.initialized.push((container_id.to_string(), plan.clone()));
        Ok(())
    }
}

/// Applies widget plans to the gallery containers of a [`Dom`].
pub struct Binder<H: WidgetHost> {
    host: H,
}

impl<H: WidgetHost> Binder<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Initialize every unprocessed container in `scope` ∩ `main`.
    ///
    /// Returns the ids initialized by this call. Calling it again on the
    /// same content initializes nothing. A container whose widget fails is
    /// left unmarked, so a later call retries it, and the remaining
    /// containers are still initialized.
    pub fn attach(&mut self, dom: &mut Dom, scope: NodeId) -> Vec<String> {
        let mut initialized = Vec::new();
        for container in find_containers(dom, scope) {
            if dom.has_attr(container, PROCESSED_MARKER) {
                continue;
            }
            let Some(id) = dom.id(container).map(str::to_string) else {
                continue;
            };

            let style =
                GalleryStyle::parse_lenient(dom.attr(container, STYLE_ATTRIBUTE).unwrap_or(""));
            let plan = widget_plan(style).scoped_to(&id);
            tracing::debug!(container = %id, style = %style, "initializing gallery widget");
            match self.host.initialize(&id, &plan) {
                Ok(()) => {
                    dom.set_attr(container, PROCESSED_MARKER, "true");
                    initialized.push(id);
                }
                Err(e) => tracing::warn!(error = %e, "gallery widget not initialized"),
            }
        }
        initialized
    }
}

/// Regions to search: `scope` when it sits inside a `main`, and every `main`
/// that sits inside `scope`.
fn search_regions(dom: &Dom, scope: NodeId) -> Vec<NodeId> {
    let mut regions = Vec::new();
    for main in dom.elements_by_tag("main") {
        let region = if dom.contains(main, scope) {
            scope
        } else if dom.contains(scope, main) {
            main
        } else {
            continue;
        };
        if !regions.contains(&region) {
            regions.push(region);
        }
    }
    regions
}

/// Gallery containers in the searched regions, each listed once.
fn find_containers(dom: &Dom, scope: NodeId) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    search_regions(dom, scope)
        .into_iter()
        .flat_map(|region| dom.subtree(region))
        .filter(|&n| dom.id(n).is_some_and(|id| id.starts_with(CONTAINER_PREFIX)))
        .filter(|n| seen.insert(*n))
        .collect()
}
