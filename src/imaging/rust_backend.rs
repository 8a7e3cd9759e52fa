//! Pure Rust image processing backend.
//!
//! No system libraries; every codec comes from the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Identify | `image::image_dimensions` (header only, no full decode) |
//! | Scale | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Scale and crop | `image::DynamicImage::resize_to_fill` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode | JPEG with quality, PNG, GIF, lossless WebP |
//!
//! Derivatives are encoded into a private staging file next to the output
//! and renamed into place, so a reader never observes a half-written file
//! even when several requests race to create the same derivative.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, ResizeMode, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` into `writer` using the requested format.
fn write_image<W: Write + Seek>(
    img: &DynamicImage,
    writer: &mut W,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut *writer, quality as u8))
        }
        OutputFormat::Png => img.write_to(&mut *writer, ImageFormat::Png),
        OutputFormat::Gif => img.write_to(&mut *writer, ImageFormat::Gif),
        OutputFormat::Webp => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut *writer, ImageFormat::WebP)
        }
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("{:?} encode failed: {}", format, e))
    })
}

/// Save a derivative atomically: encode into a uniquely named staging file
/// in the output directory, then move it over `path`.
///
/// Every call gets its own staging file, so concurrent writers of the same
/// derivative never share one. The last rename wins and each rename installs
/// a complete file. A failed encode drops the staging file.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staging = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(staging.as_file_mut());
        write_image(img, &mut writer, format, quality)?;
        writer.flush()?;
    }
    staging.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;

        let resized = match params.mode {
            ResizeMode::Fit => img.resize_exact(params.width, params.height, FilterType::Lanczos3),
            ResizeMode::Fill => {
                img.resize_to_fill(params.width, params.height, FilterType::Lanczos3)
            }
        };

        let final_img = if let Some(sharpening) = params.sharpening {
            DynamicImage::from(image::imageops::unsharpen(
                &resized,
                sharpening.sigma,
                sharpening.threshold,
            ))
        } else {
            resized
        };

        save_image(
            &final_img,
            &params.output,
            params.format,
            params.quality.value(),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::imaging::params::{Quality, Sharpening};
    use image::{ImageEncoder, RgbImage};
    use std::path::PathBuf;

    /// Create a small valid JPEG file with the given dimensions.
    pub(crate) fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn params(source: PathBuf, output: PathBuf, w: u32, h: u32, mode: ResizeMode) -> ResizeParams {
        let format = OutputFormat::from_path(&output).unwrap();
        ResizeParams {
            source,
            output,
            width: w,
            height: h,
            mode,
            format,
            quality: Quality::new(85),
            sharpening: None,
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_non_image_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("notes.jpg");
        std::fs::write(&path, "definitely not a jpeg").unwrap();

        let backend = RustBackend::new();
        assert!(backend.identify(&path).is_err());
    }

    #[test]
    fn resize_fit_writes_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("styles/medium/public/source.jpg");
        let backend = RustBackend::new();
        backend
            .resize(&params(source, output.clone(), 200, 150, ResizeMode::Fit))
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn resize_fill_crops_to_box() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);

        let output = tmp.path().join("thumb.png");
        let backend = RustBackend::new();
        let mut p = params(source, output.clone(), 120, 120, ResizeMode::Fill);
        p.sharpening = Some(Sharpening::light());
        backend.resize(&p).unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (120, 120));
    }

    #[test]
    fn resize_to_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 300, 200);

        let output = tmp.path().join("source.jpg.webp");
        let backend = RustBackend::new();
        backend
            .resize(&params(source, output.clone(), 150, 100, ResizeMode::Fit))
            .unwrap();

        assert!(output.exists());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn resize_leaves_no_staging_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let out_dir = tmp.path().join("out");
        let output = out_dir.join("a.jpg");
        RustBackend::new()
            .resize(&params(source, output, 50, 50, ResizeMode::Fit))
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn concurrent_resizes_of_one_output_all_succeed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 640, 480);

        let out_dir = tmp.path().join("out");
        let output = out_dir.join("a.jpg");
        let backend = RustBackend::new();
        let p = params(source, output.clone(), 320, 240, ResizeMode::Fit);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| backend.resize(&p))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (320, 240));
        let names: Vec<String> = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn resize_undecodable_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, "garbage").unwrap();

        let output = tmp.path().join("out.jpg");
        let result =
            RustBackend::new().resize(&params(source, output.clone(), 10, 10, ResizeMode::Fit));
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
