//! Artifact registry: scans the output directory for finished media files
//!
//! The registry does not track which job produced which file. It lists
//! whatever recognized media exists in the output directory (and its playlist
//! sub-directories), newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Default number of artifacts returned by [`ArtifactRegistry::list_recent`]
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Output directory plus one level of playlist folders
const SCAN_DEPTH: usize = 2;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv"];

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Media kind, derived from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Audio-only container
    Audio,
    /// Video container
    Video,
}

impl ArtifactKind {
    /// Kind for a path, or `None` if the extension is not recognized
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(ArtifactKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(ArtifactKind::Video)
        } else {
            None
        }
    }
}

/// One media file found in the output directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Full path
    pub path: PathBuf,
    /// Full file name (not truncated)
    pub name: String,
    /// Size on disk
    pub size_bytes: u64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
    /// Audio or video
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Size in MiB
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MIB
    }
}

/// Read-only view over the output directory
#[derive(Clone, Debug)]
pub struct ArtifactRegistry {
    root: PathBuf,
}

impl ArtifactRegistry {
    /// Create a registry over `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan for all recognized artifacts, newest first
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryScan`] if the output directory itself cannot be
    /// read. Unreadable entries below it are skipped.
    pub fn scan(&self) -> Result<Vec<Artifact>> {
        std::fs::read_dir(&self.root).map_err(|e| Error::RegistryScan {
            path: self.root.clone(),
            reason: e.to_string(),
        })?;

        let mut artifacts: Vec<Artifact> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(SCAN_DEPTH)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| artifact_from_entry(entry.path()))
            .collect();

        artifacts.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(artifacts)
    }

    /// The `limit` most recently modified artifacts, newest first
    ///
    /// Listing is advisory: if the directory cannot be read, this logs a
    /// warning and returns an empty list.
    pub fn list_recent(&self, limit: usize) -> Vec<Artifact> {
        match self.scan() {
            Ok(mut artifacts) => {
                artifacts.truncate(limit);
                artifacts
            }
            Err(e) => {
                tracing::warn!(error = %e, "Artifact scan failed, returning empty list");
                Vec::new()
            }
        }
    }
}

fn artifact_from_entry(path: &Path) -> Option<Artifact> {
    let kind = ArtifactKind::from_path(path)?;
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    let name = path.file_name()?.to_string_lossy().into_owned();

    Some(Artifact {
        path: path.to_path_buf(),
        name,
        size_bytes: metadata.len(),
        modified_at: DateTime::<Utc>::from(modified),
        kind,
    })
}
