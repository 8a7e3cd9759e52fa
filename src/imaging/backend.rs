//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the mock
//! backend below, which records calls instead of touching pixels.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `identify` doubles as the validity check: a file the backend cannot
/// identify is not a usable image.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Write a derivative as described by `params`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{OutputFormat, Quality, ResizeMode};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of touching pixels.
    ///
    /// `identify` answers from a path → dimensions table. `resize` writes a
    /// placeholder file at the output path and registers its dimensions, so
    /// existence checks and re-identification behave like the real thing.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub images: Mutex<HashMap<PathBuf, Dimensions>>,
        pub failing_outputs: Mutex<Vec<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            mode: ResizeMode,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_images(images: &[(&Path, Dimensions)]) -> Self {
            let backend = Self::new();
            {
                let mut table = backend.images.lock().unwrap();
                for (path, dims) in images {
                    table.insert(path.to_path_buf(), *dims);
                }
            }
            backend
        }

        /// Make every resize whose output path contains `fragment` fail.
        pub fn fail_outputs_containing(&self, fragment: &str) {
            self.failing_outputs
                .lock()
                .unwrap()
                .push(fragment.to_string());
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn resize_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Resize { .. }))
                .count()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.images
                .lock()
                .unwrap()
                .get(path)
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            let output = params.output.to_string_lossy().to_string();
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: output.clone(),
                width: params.width,
                height: params.height,
                mode: params.mode,
                quality: params.quality.value(),
            });

            if self
                .failing_outputs
                .lock()
                .unwrap()
                .iter()
                .any(|f| output.contains(f.as_str()))
            {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {output}"
                )));
            }

            if let Some(parent) = params.output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&params.output, b"derivative")?;
            self.images.lock().unwrap().insert(
                params.output.clone(),
                Dimensions {
                    width: params.width,
                    height: params.height,
                },
            );
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_images(&[(
            Path::new("/test/image.jpg"),
            Dimensions {
                width: 800,
                height: 600,
            },
        )]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_unknown_path_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/missing.jpg")).is_err());
    }

    #[test]
    fn mock_resize_writes_placeholder_and_registers_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("styles/medium/public/a.jpg");
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: output.clone(),
                width: 220,
                height: 165,
                mode: ResizeMode::Fit,
                format: OutputFormat::Jpeg,
                quality: Quality::new(90),
                sharpening: None,
            })
            .unwrap();

        assert!(output.exists());
        assert_eq!(
            backend.identify(&output).unwrap(),
            Dimensions {
                width: 220,
                height: 165
            }
        );
        assert_eq!(backend.resize_count(), 1);
    }

    #[test]
    fn mock_resize_failure_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        backend.fail_outputs_containing("/large/");

        let result = backend.resize(&ResizeParams {
            source: "/source.jpg".into(),
            output: tmp.path().join("styles/large/public/a.jpg"),
            width: 480,
            height: 360,
            mode: ResizeMode::Fit,
            format: OutputFormat::Jpeg,
            quality: Quality::default(),
            sharpening: None,
        });
        assert!(result.is_err());
        assert!(!tmp.path().join("styles/large/public/a.jpg").exists());
    }
}
