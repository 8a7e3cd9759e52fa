//! Pure calculation functions for derivative dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! They also answer "what size would this derivative be" without creating
//! it, which the resolver needs when creation is suppressed.

/// Calculate the output dimensions of a `scale` effect.
///
/// Fits the source inside the `width` x `height` box while keeping the
/// aspect ratio. Either bound may be absent, in which case only the other
/// one constrains. Without `upscale`, a source that already fits is left
/// at its original size.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `width` - Optional maximum width
/// * `height` - Optional maximum height
/// * `upscale` - Whether smaller sources may be enlarged
///
/// # Examples
/// ```
/// # use slide_gal::imaging::calculate_scale_dimensions;
/// // 1600x1200 into a 220x220 box → 220x165
/// assert_eq!(calculate_scale_dimensions((1600, 1200), Some(220), Some(220), false), (220, 165));
///
/// // 100x80 into a 220x220 box without upscaling → unchanged
/// assert_eq!(calculate_scale_dimensions((100, 80), Some(220), Some(220), false), (100, 80));
/// ```
pub fn calculate_scale_dimensions(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    upscale: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let aspect = src_h as f64 / src_w as f64;
    let (out_w, out_h) = match (width, height) {
        (None, None) => return source,
        (Some(w), None) => (w, (w as f64 * aspect).round() as u32),
        (None, Some(h)) => ((h as f64 / aspect).round() as u32, h),
        (Some(w), Some(h)) => {
            if aspect < h as f64 / w as f64 {
                // Width is the binding constraint
                (w, (w as f64 * aspect).round() as u32)
            } else {
                ((h as f64 / aspect).round() as u32, h)
            }
        }
    };

    if !upscale && (out_w >= src_w || out_h >= src_h) {
        return source;
    }

    (out_w.max(1), out_h.max(1))
}

/// Calculate the output dimensions of a `scale_and_crop` effect.
///
/// The result always matches the requested box exactly; the source is
/// scaled to cover it and the overflow is cropped from the center.
pub fn calculate_crop_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}
