//! Output profiles and their resolution into engine configuration
//!
//! A [`Profile`] is the user-facing selector (resolution tier, audio-only or
//! playlist). [`resolve`] turns it into an [`EngineConfig`]: the format
//! constraint, output path template, optional post-processing and the
//! per-item error policy. Resolution is pure and performs no I/O.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Bitrate used when extracting audio
pub const AUDIO_BITRATE_KBPS: u32 = 192;

/// Maximum height used for playlist items
pub const PLAYLIST_MAX_HEIGHT: u32 = 720;

/// File name used when the media title is unavailable
pub const FALLBACK_TITLE: &str = "Unknown Video";

/// Directory name used when the playlist title is unavailable
pub const FALLBACK_PLAYLIST: &str = "Unknown Playlist";

/// Requested output profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// Best video not taller than 360 lines
    #[serde(rename = "360p")]
    P360,
    /// Best video not taller than 480 lines
    #[serde(rename = "480p")]
    P480,
    /// Best video not taller than 720 lines
    #[serde(rename = "720p")]
    P720,
    /// Best video not taller than 1080 lines
    #[serde(rename = "1080p")]
    P1080,
    /// Best audio, converted to MP3
    #[serde(rename = "audio")]
    AudioOnly,
    /// Every item of a playlist, up to 720p, nested under the playlist name
    #[serde(rename = "playlist")]
    Playlist,
}

impl Profile {
    /// All profiles, in display order
    pub const ALL: [Profile; 6] = [
        Profile::P360,
        Profile::P480,
        Profile::P720,
        Profile::P1080,
        Profile::AudioOnly,
        Profile::Playlist,
    ];

    /// Vertical resolution cap, if the profile has one
    pub fn max_height(self) -> Option<u32> {
        match self {
            Profile::P360 => Some(360),
            Profile::P480 => Some(480),
            Profile::P720 => Some(720),
            Profile::P1080 => Some(1080),
            Profile::AudioOnly => None,
            Profile::Playlist => Some(PLAYLIST_MAX_HEIGHT),
        }
    }

    /// Short label for display
    pub fn label(self) -> &'static str {
        match self {
            Profile::P360 => "360p",
            Profile::P480 => "480p",
            Profile::P720 => "720p",
            Profile::P1080 => "1080p",
            Profile::AudioOnly => "MP3",
            Profile::Playlist => "Playlist",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "360p" | "360" => Ok(Profile::P360),
            "480p" | "480" => Ok(Profile::P480),
            "720p" | "720" => Ok(Profile::P720),
            "1080p" | "1080" => Ok(Profile::P1080),
            "audio" | "audio-only" | "audioonly" | "mp3" => Ok(Profile::AudioOnly),
            "playlist" => Ok(Profile::Playlist),
            _ => Err(Error::UnsupportedProfile(s.to_string())),
        }
    }
}

/// Audio container produced by post-processing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Layer III
    Mp3,
}

impl AudioCodec {
    /// Codec name as the engine expects it
    pub fn as_str(self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
        }
    }
}

/// Post-processing directive applied after download
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcess {
    /// Extract the audio stream and transcode it
    ExtractAudio {
        /// Target codec
        codec: AudioCodec,
        /// Target bitrate in kbit/s
        bitrate_kbps: u32,
    },
}

/// Where output files go and how they are named
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTemplate {
    /// Output directory
    pub dir: PathBuf,
    /// Nest files under a directory named after the playlist
    pub nest_by_playlist: bool,
}

impl OutputTemplate {
    /// Template string in the engine's `%(field)s` syntax
    ///
    /// Missing titles fall back to [`FALLBACK_TITLE`] / [`FALLBACK_PLAYLIST`].
    /// A literal `%` in the directory is escaped as `%%`.
    pub fn to_engine_template(&self) -> String {
        let mut template = PathBuf::from(self.dir.to_string_lossy().replace('%', "%%"));
        if self.nest_by_playlist {
            template.push(format!("%(playlist_title|{FALLBACK_PLAYLIST})s"));
        }
        template.push(format!("%(title|{FALLBACK_TITLE})s.%(ext)s"));
        template.to_string_lossy().into_owned()
    }

    /// Concrete path for a title, with unsafe characters replaced
    pub fn render(&self, title: Option<&str>, playlist_title: Option<&str>, ext: &str) -> PathBuf {
        let mut path = self.dir.clone();
        if self.nest_by_playlist {
            path.push(sanitize_or(playlist_title, FALLBACK_PLAYLIST));
        }
        let stem = sanitize_or(title, FALLBACK_TITLE);
        if ext.is_empty() {
            path.push(stem);
        } else {
            path.push(format!("{stem}.{ext}"));
        }
        path
    }
}

/// Concrete engine configuration for one job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Format selector, e.g. `best[height<=720]`
    pub format: String,
    /// Output naming
    pub output: OutputTemplate,
    /// Optional post-processing
    pub post_process: Option<PostProcess>,
    /// Download every playlist entry instead of a single item
    pub playlist: bool,
    /// Keep going when a playlist entry fails
    pub ignore_item_errors: bool,
}

/// Resolve a profile into engine configuration rooted at `output_dir`
pub fn resolve(profile: Profile, output_dir: &Path) -> EngineConfig {
    let flat = OutputTemplate {
        dir: output_dir.to_path_buf(),
        nest_by_playlist: false,
    };

    match profile {
        Profile::P360 | Profile::P480 | Profile::P720 | Profile::P1080 => EngineConfig {
            format: height_capped_format(profile.max_height().unwrap_or(PLAYLIST_MAX_HEIGHT)),
            output: flat,
            post_process: None,
            playlist: false,
            ignore_item_errors: false,
        },
        Profile::AudioOnly => EngineConfig {
            format: "bestaudio/best".to_string(),
            output: flat,
            post_process: Some(PostProcess::ExtractAudio {
                codec: AudioCodec::Mp3,
                bitrate_kbps: AUDIO_BITRATE_KBPS,
            }),
            playlist: false,
            ignore_item_errors: false,
        },
        Profile::Playlist => EngineConfig {
            format: height_capped_format(PLAYLIST_MAX_HEIGHT),
            output: OutputTemplate {
                dir: output_dir.to_path_buf(),
                nest_by_playlist: true,
            },
            post_process: None,
            playlist: true,
            ignore_item_errors: true,
        },
    }
}

/// Parse a profile token and resolve it in one step
pub fn resolve_token(token: &str, output_dir: &Path) -> crate::Result<EngineConfig> {
    let profile: Profile = token.parse()?;
    Ok(resolve(profile, output_dir))
}

fn height_capped_format(height: u32) -> String {
    format!("best[height<={height}]")
}

/// Replace characters that are unsafe in file names
///
/// Path separators, Windows-reserved characters and control characters become
/// `_`; leading/trailing whitespace and trailing dots are trimmed. Returns an
/// empty string if nothing usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.chars().all(|c| c == '_' || c == '.') {
        return String::new();
    }
    trimmed.to_string()
}

fn sanitize_or(name: Option<&str>, fallback: &str) -> String {
    name.map(sanitize_filename)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
