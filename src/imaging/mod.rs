//! Image processing for style derivatives, built on the pure-Rust `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Scale** | `resize_exact` (Lanczos3) |
//! | **Scale and crop** | `resize_to_fill` + optional `unsharpen` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_crop_dimensions, calculate_scale_dimensions};
pub use params::{OutputFormat, Quality, ResizeMode, ResizeParams, Sharpening};
pub use rust_backend::RustBackend;
