//! Parser for yt-dlp output lines
//!
//! The CLI engine asks yt-dlp to tag the lines it cares about:
//! - `PROGRESS:{json}` from `--progress-template`
//! - `ARTIFACT:{json}` from `--print after_move:...`
//! - `PLAYLIST_DONE:{json}` from `--print playlist:...`, once every entry
//!   of a playlist has been processed
//!
//! Lines starting with `ERROR:` are yt-dlp's own error reports. Everything else
//! is informational.

use serde::Deserialize;
use std::path::PathBuf;

use crate::progress::RawProgress;

/// Prefix marking a progress line
pub(crate) const PROGRESS_PREFIX: &str = "PROGRESS:";

/// Prefix marking a completed-file line
pub(crate) const ARTIFACT_PREFIX: &str = "ARTIFACT:";

/// Prefix marking the end of a playlist
pub(crate) const PLAYLIST_DONE_PREFIX: &str = "PLAYLIST_DONE:";

const ERROR_PREFIX: &str = "ERROR:";

/// File reported by yt-dlp once it has been moved into place
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrintedArtifact {
    /// Media title
    #[serde(default)]
    pub title: Option<String>,
    /// Final path
    #[serde(default)]
    pub filepath: Option<PathBuf>,
    /// Playlist title, when downloading a playlist
    #[serde(default)]
    pub playlist_title: Option<String>,
}

/// One classified line of engine output
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLine {
    /// Raw progress payload
    Progress(RawProgress),
    /// A file was completed
    Artifact(PrintedArtifact),
    /// A playlist was fully processed, with its title if known
    PlaylistDone(Option<String>),
    /// yt-dlp reported an error
    Error(String),
    /// Anything else
    Other,
}

/// Classify a single output line
///
/// Tagged lines with malformed JSON are treated as [`EngineLine::Other`].
pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();

    if let Some(json) = trimmed.strip_prefix(PROGRESS_PREFIX) {
        return match RawProgress::from_json(json) {
            Ok(raw) => EngineLine::Progress(raw),
            Err(e) => {
                tracing::debug!(error = %e, line, "Unparseable progress line");
                EngineLine::Other
            }
        };
    }

    if let Some(json) = trimmed.strip_prefix(ARTIFACT_PREFIX) {
        return match serde_json::from_str::<PrintedArtifact>(json) {
            Ok(artifact) => EngineLine::Artifact(artifact),
            Err(e) => {
                tracing::debug!(error = %e, line, "Unparseable artifact line");
                EngineLine::Other
            }
        };
    }

    if let Some(json) = trimmed.strip_prefix(PLAYLIST_DONE_PREFIX) {
        // `%(title)j` prints `null` for an untitled playlist
        return match serde_json::from_str::<Option<String>>(json) {
            Ok(title) => EngineLine::PlaylistDone(title),
            Err(e) => {
                tracing::debug!(error = %e, line, "Unparseable playlist line");
                EngineLine::Other
            }
        };
    }

    if let Some(message) = trimmed.strip_prefix(ERROR_PREFIX) {
        return EngineLine::Error(message.trim().to_string());
    }

    EngineLine::Other
}
