//! Image derivative resolution.
//!
//! Given a source image and a style name, [`FileDerivativeResolver`] answers
//! with the derivative's URL, URI, size, and dimensions, creating the file
//! on first request. Derivatives live in the public files directory:
//!
//! ```text
//! <public_dir>/photos/dawn.jpg                         source
//! <public_dir>/styles/medium/public/photos/dawn.jpg    medium derivative
//! <public_dir>/styles/hero/public/photos/dawn.jpg.webp converting style
//! ```
//!
//! The gallery builder only sees the [`DerivativeResolver`] capability, and
//! every failure is reported as `None` there. Internally the resolver works
//! with [`DerivativeError`] so the reason can be logged.
//!
//! Creation is check-then-create with no locking. Requests racing on the
//! same derivative each write it; the backend renames complete files into
//! place so readers see one or the other, never a partial file. A request
//! whose own write fails still succeeds if a complete derivative is in place
//! afterwards.

use crate::cache::{ResolveStats, StyleManifest};
use crate::config::{ImageStyle, SiteConfig};
use crate::imaging::{BackendError, Dimensions, ImageBackend, OutputFormat, ResizeParams};
use crate::types::{ImageReference, ImageVariant, PUBLIC_SCHEME, StyleName, format_size};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the public dir holding all derivatives.
const STYLES_DIR: &str = "styles";

#[derive(Error, Debug)]
pub enum DerivativeError {
    #[error("unsupported scheme '{0}' (only public:// files can be styled)")]
    UnsupportedScheme(String),
    #[error("invalid image path '{0}'")]
    InvalidPath(String),
    #[error("unknown image style '{0}'")]
    UnknownStyle(String),
    #[error("source image not found: {}", .0.display())]
    MissingSource(PathBuf),
    #[error("no encoder for {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("image error: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Capability the gallery builder uses to look up image renditions.
pub trait DerivativeResolver {
    /// Derivative of `image` in `style`; `None` when it cannot be produced.
    fn resolve(&self, image: &ImageReference, style: &StyleName) -> Option<ImageVariant>;

    /// The unmodified source file; `None` when it is missing or not an image.
    fn describe_original(&self, image: &ImageReference) -> Option<ImageVariant>;
}

/// Resolver backed by a public files directory and an image backend.
pub struct FileDerivativeResolver<B: ImageBackend> {
    public_dir: PathBuf,
    base_url: String,
    styles: BTreeMap<String, ImageStyle>,
    backend: B,
    dont_create: bool,
    stats: Mutex<ResolveStats>,
}

impl<B: ImageBackend> FileDerivativeResolver<B> {
    pub fn new(config: &SiteConfig, backend: B) -> Self {
        Self {
            public_dir: PathBuf::from(&config.site.public_dir),
            base_url: config.site.base_url.trim_end_matches('/').to_string(),
            styles: config.styles.clone(),
            backend,
            dont_create: false,
            stats: Mutex::new(ResolveStats::default()),
        }
    }

    /// Never write derivatives; report what they would be instead.
    pub fn with_dont_create(mut self, dont_create: bool) -> Self {
        self.dont_create = dont_create;
        self
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Snapshot of lookup outcomes so far.
    pub fn stats(&self) -> ResolveStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record(&self, update: impl FnOnce(&mut ResolveStats)) {
        let mut guard = self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut guard);
    }

    /// Flush derivatives of styles that changed or disappeared since the
    /// last run, then record the current definitions.
    ///
    /// Returns the flushed style names. Does nothing with `dont_create` set,
    /// since that mode must not touch storage.
    pub fn sync_styles(&self) -> Result<Vec<String>, DerivativeError> {
        if self.dont_create {
            return Ok(Vec::new());
        }
        let previous = StyleManifest::load(&self.public_dir);
        let current = StyleManifest::from_styles(&self.styles);
        let stale = previous.stale_styles(&current);
        for name in &stale {
            let removed = self.flush_style(name)?;
            tracing::info!(style = %name, removed, "style definition changed, derivatives flushed");
        }
        if previous != current {
            current.save(&self.public_dir)?;
        }
        Ok(stale)
    }

    /// Delete every derivative of a style.
    ///
    /// Returns how many derivative files were removed.
    pub fn flush_style(&self, name: &str) -> Result<usize, DerivativeError> {
        if !is_safe_segment(name) {
            return Err(DerivativeError::InvalidPath(name.to_string()));
        }
        let dir = self.public_dir.join(STYLES_DIR).join(name);
        if !dir.exists() {
            return Ok(0);
        }
        let removed = WalkDir::new(&dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        std::fs::remove_dir_all(&dir)?;
        Ok(removed)
    }

    /// Filesystem path of a `public://` source.
    pub fn source_path(&self, image: &ImageReference) -> Result<PathBuf, DerivativeError> {
        if image.scheme() != PUBLIC_SCHEME {
            return Err(DerivativeError::UnsupportedScheme(image.scheme().to_string()));
        }
        let target = image.target();
        let relative = Path::new(target);
        let clean = !target.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(DerivativeError::InvalidPath(image.uri().to_string()));
        }
        Ok(self.public_dir.join(relative))
    }

    /// Path of the derivative relative to the public dir,
    /// e.g. `styles/medium/public/photos/dawn.jpg`.
    fn derivative_target(
        &self,
        image: &ImageReference,
        style_name: &StyleName,
        style: &ImageStyle,
        source: &Path,
    ) -> String {
        let mut target = format!(
            "{}/{}/{}/{}",
            STYLES_DIR,
            style_name,
            PUBLIC_SCHEME,
            image.target()
        );
        if let Some(convert) = style.convert
            && OutputFormat::from_path(source) != Some(convert)
        {
            target.push('.');
            target.push_str(convert.extension());
        }
        target
    }

    fn variant(&self, target: &str, file_size: u64, dims: (u32, u32)) -> ImageVariant {
        ImageVariant {
            url: format!("{}/{}", self.base_url, encode_path(target)),
            uri: format!("{}://{}", PUBLIC_SCHEME, target),
            file_size,
            file_size_formatted: format_size(file_size),
            width: dims.0,
            height: dims.1,
        }
    }

    /// Resolve with the failure reason kept.
    pub fn try_resolve(
        &self,
        image: &ImageReference,
        style_name: &StyleName,
    ) -> Result<ImageVariant, DerivativeError> {
        let style = self
            .styles
            .get(style_name.as_str())
            .ok_or_else(|| DerivativeError::UnknownStyle(style_name.to_string()))?;
        let source = self.existing_source(image)?;
        let target = self.derivative_target(image, style_name, style, &source);
        let output = self.public_dir.join(&target);

        if output.is_file() {
            let dims = self.backend.identify(&output)?;
            let size = std::fs::metadata(&output)?.len();
            self.record(|s| s.existing += 1);
            return Ok(self.variant(&target, size, (dims.width, dims.height)));
        }

        // Identifying the source doubles as the "is this an image" check
        let Dimensions { width, height } = self.backend.identify(&source)?;
        let dims = style.derivative_dimensions((width, height));

        if self.dont_create {
            let size = std::fs::metadata(&source)?.len();
            self.record(|s| s.skipped += 1);
            return Ok(self.variant(&target, size, dims));
        }

        let format = style
            .convert
            .or_else(|| OutputFormat::from_path(&source))
            .ok_or_else(|| DerivativeError::UnsupportedFormat(source.clone()))?;

        let written = self.backend.resize(&ResizeParams {
            source: source.clone(),
            output: output.clone(),
            width: dims.0,
            height: dims.1,
            mode: style.resize_mode(),
            format,
            quality: style.encoding_quality(),
            sharpening: style.sharpening(),
        });
        if let Err(e) = written {
            // Another writer may have installed the same derivative meanwhile
            if !output.is_file() {
                return Err(e.into());
            }
            tracing::debug!(style = %style_name, error = %e, "write failed, reusing concurrent derivative");
            let dims = self.backend.identify(&output)?;
            let size = std::fs::metadata(&output)?.len();
            self.record(|s| s.existing += 1);
            return Ok(self.variant(&target, size, (dims.width, dims.height)));
        }
        tracing::debug!(style = %style_name, output = %output.display(), "derivative created");

        let size = std::fs::metadata(&output)?.len();
        self.record(|s| s.created += 1);
        Ok(self.variant(&target, size, dims))
    }

    /// Describe the original with the failure reason kept.
    pub fn try_describe_original(
        &self,
        image: &ImageReference,
    ) -> Result<ImageVariant, DerivativeError> {
        let source = self.existing_source(image)?;
        let dims = self.backend.identify(&source)?;
        let size = std::fs::metadata(&source)?.len();
        Ok(self.variant(image.target(), size, (dims.width, dims.height)))
    }

    fn existing_source(&self, image: &ImageReference) -> Result<PathBuf, DerivativeError> {
        let source = self.source_path(image)?;
        if !source.is_file() {
            return Err(DerivativeError::MissingSource(source));
        }
        Ok(source)
    }
}

impl<B: ImageBackend> DerivativeResolver for FileDerivativeResolver<B> {
    fn resolve(&self, image: &ImageReference, style: &StyleName) -> Option<ImageVariant> {
        match self.try_resolve(image, style) {
            Ok(variant) => Some(variant),
            Err(e) => {
                self.record(|s| s.failed += 1);
                tracing::warn!(image = %image, style = %style, error = %e, "derivative unavailable");
                None
            }
        }
    }

    fn describe_original(&self, image: &ImageReference) -> Option<ImageVariant> {
        match self.try_describe_original(image) {
            Ok(variant) => Some(variant),
            Err(e) => {
                self.record(|s| s.failed += 1);
                tracing::warn!(image = %image, error = %e, "original image unavailable");
                None
            }
        }
    }
}

fn is_safe_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Percent-encode a relative path for use in a URL, keeping `/`.
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
