//! Configuration types for media-dl

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Job execution configuration (output location, concurrency, listing)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory (default: "./downloads"), created at startup
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum jobs running at once (None = unbounded)
    ///
    /// Jobs waiting for a slot stay `Queued`.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,

    /// Number of artifacts kept in the refreshed snapshot (default: 10)
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_jobs: None,
            recent_limit: default_recent_limit(),
        }
    }
}

/// External tool paths (yt-dlp, ffmpeg)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable or its directory (yt-dlp's own lookup if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Extra arguments passed to every yt-dlp invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
            extra_args: Vec::new(),
        }
    }
}

/// Main configuration for MediaDownloader
///
/// Sub-configs are flattened, so the serialized form has no nesting:
///
/// ```json
/// { "output_dir": "downloads", "max_concurrent_jobs": 2, "ytdlp_path": "/usr/bin/yt-dlp" }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Job execution settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.download.output_dir
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.download.output_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "output_dir must not be empty".into(),
                key: Some("output_dir".into()),
            });
        }
        if self.download.max_concurrent_jobs == Some(0) {
            return Err(Error::Config {
                message: "max_concurrent_jobs must be at least 1 (omit it for no limit)".into(),
                key: Some("max_concurrent_jobs".into()),
            });
        }
        if self.download.recent_limit == 0 {
            return Err(Error::Config {
                message: "recent_limit must be at least 1".into(),
                key: Some("recent_limit".into()),
            });
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_recent_limit() -> usize {
    crate::artifacts::DEFAULT_RECENT_LIMIT
}

fn default_true() -> bool {
    true
}
