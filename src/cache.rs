//! Style manifest for derivative invalidation.
//!
//! Derivatives live on disk under `styles/<style>/public/` and are reused for
//! as long as the file exists. That is only correct while the style that
//! produced them stays the same: after `[styles.medium] width` changes, every
//! existing `medium` derivative is stale.
//!
//! # Design
//!
//! The manifest records one SHA-256 hash per style definition. When a
//! resolver is opened, the current registry is compared against the stored
//! hashes:
//!
//! - a style whose hash differs has **changed**: its derivatives are flushed
//! - a style present in the manifest but gone from the registry was
//!   **removed**: its derivatives are flushed too
//! - a style not in the manifest is **new**: nothing on disk can be stale
//!
//! Only the parameters that affect pixels are hashed. Editing a style's
//! `label` does not invalidate anything.
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<public_dir>/.style-manifest.json`, next
//! to the `styles/` tree it describes. A missing, corrupt, or
//! version-mismatched manifest loads as empty, which treats every style as
//! new rather than flushing everything.

use crate::config::{ImageStyle, StyleEffect};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the style manifest file within the public directory.
const MANIFEST_FILENAME: &str = ".style-manifest.json";

/// Version of the manifest format. Bump this when the hash inputs change.
const MANIFEST_VERSION: u32 = 1;

/// On-disk record of the style definitions derivatives were built with.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleManifest {
    pub version: u32,
    /// Style name → params hash.
    pub styles: BTreeMap<String, String>,
}

impl StyleManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            styles: BTreeMap::new(),
        }
    }

    /// Manifest describing the given registry.
    pub fn from_styles(styles: &BTreeMap<String, ImageStyle>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            styles: styles
                .iter()
                .map(|(name, style)| (name.clone(), hash_style(style)))
                .collect(),
        }
    }

    /// Load from the public directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed.
    pub fn load(public_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(public_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, public_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(public_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(public_dir), json)
    }

    /// Styles whose derivatives are stale relative to `current`.
    ///
    /// Returned in name order: changed styles and removed styles.
    pub fn stale_styles(&self, current: &StyleManifest) -> Vec<String> {
        self.styles
            .iter()
            .filter(|(name, hash)| current.styles.get(*name) != Some(*hash))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// SHA-256 hash of the parameters of a style that affect its output.
pub fn hash_style(style: &ImageStyle) -> String {
    let mut hasher = Sha256::new();
    hasher.update(match style.effect {
        StyleEffect::Scale => b"scale\0".as_slice(),
        StyleEffect::ScaleAndCrop => b"scale_and_crop\0".as_slice(),
    });
    for bound in [style.width, style.height] {
        match bound {
            Some(v) => {
                hasher.update(b"\x01");
                hasher.update(v.to_le_bytes());
            }
            None => hasher.update(b"\x00"),
        }
    }
    hasher.update([style.upscale as u8, style.sharpen as u8]);
    hasher.update(style.quality.to_le_bytes());
    match style.convert {
        Some(format) => hasher.update(format.extension().as_bytes()),
        None => hasher.update(b"\x00"),
    }
    format!("{:x}", hasher.finalize())
}

/// Resolve the manifest path for a public directory.
pub fn manifest_path(public_dir: &Path) -> PathBuf {
    public_dir.join(MANIFEST_FILENAME)
}

/// Outcome counts for derivative lookups during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveStats {
    /// Derivative was already on disk.
    pub existing: u32,
    /// Derivative was created by this run.
    pub created: u32,
    /// Derivative was missing and creation was suppressed.
    pub skipped: u32,
    /// Lookup failed (bad source, unknown style, I/O error).
    pub failed: u32,
}

impl ResolveStats {
    pub fn total(&self) -> u32 {
        self.existing + self.created + self.skipped + self.failed
    }
}

impl fmt::Display for ResolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} existing, {} created",
            self.existing, self.created
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
