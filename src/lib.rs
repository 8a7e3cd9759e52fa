//! # Slide Gal
//!
//! Renders an image field as a slider or grid gallery. Each image is shown in
//! three renditions (inline, pager thumbnail, and lightbox full view), each
//! produced by a named image style. The output is markup with a stable
//! container id that a small client script binds to a slider or lightbox
//! widget.
//!
//! # Architecture: Resolve → Build → Bind
//!
//! ```text
//! field.json ──► gallery::build_view_model ──► render (Maud) ──► page
//!                      │                                          │
//!                      ▼                                          ▼
//!            derivative::DerivativeResolver            binder (client script)
//!                      │
//!                      ▼
//!            imaging::ImageBackend
//! ```
//!
//! - The **resolver** maps (image, style) to a derivative on disk, creating it
//!   on first request.
//! - The **builder** turns a field value and the formatter settings into a
//!   render-agnostic [`gallery::GalleryViewModel`].
//! - The **binder** picks the widget for each container from its gallery style
//!   and initializes it once.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`derivative`] | Image derivative resolver: canonical paths, lazy creation, flush |
//! | [`gallery`] | View model builder: container ids, per-role resolution, attachments |
//! | [`binder`] | Widget option tables, container discovery, idempotent binding |
//! | [`render`] | Maud markup for the gallery fragment and preview pages |
//! | [`config`] | `config.toml` loading, validation, formatter variants, image styles |
//! | [`cache`] | Style manifest that flushes derivatives when a style changes |
//! | [`field`] | Field value JSON input |
//! | [`style`] | Gallery style enum and its wire spelling |
//! | [`types`] | Shared types: image references, style names, variants |
//! | [`dom`] | Element tree the binder runs over outside a browser |
//! | [`imaging`] | Pure-Rust image operations: identify, scale, scale and crop |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Failures Degrade, Never Abort
//!
//! A gallery with a broken image should still render its other images. The
//! resolver reports every failure as a missing rendition (and logs why), the
//! builder keeps one entry per field item regardless, and the renderer falls
//! back between roles or leaves the item out. Only the CLI's own file
//! handling returns errors.
//!
//! ## Option Tables Live on the Server
//!
//! The per-style widget options are Rust data ([`binder::widget_plan`]) and
//! are serialized into the client script whenever it is emitted. The
//! script only does discovery and dispatch, so the table cannot differ
//! between what is tested here and what runs in the browser.
//!
//! ## Derivatives Are Reused Until Their Style Changes
//!
//! A derivative on disk is trusted as long as it exists. Editing a style
//! definition flushes that style's derivatives the next time a resolver is
//! opened, using the hashes kept in the [`cache`] manifest.

pub mod binder;
pub mod cache;
pub mod config;
pub mod derivative;
pub mod dom;
pub mod field;
pub mod gallery;
pub mod imaging;
pub mod output;
pub mod render;
pub mod style;
pub mod types;
