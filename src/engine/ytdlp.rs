//! CLI engine using the external yt-dlp binary

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::parser::{
    ARTIFACT_PREFIX, EngineLine, PLAYLIST_DONE_PREFIX, PROGRESS_PREFIX, parse_line,
};
use super::traits::{EngineError, EngineOutput, FetchEngine, ProgressCallback};
use crate::profile::{EngineConfig, PostProcess};

/// Number of stderr lines kept for the failure message
const STDERR_TAIL_LINES: usize = 20;

/// CLI engine driving the external `yt-dlp` binary
///
/// Progress and completed files are read from tagged lines on stdout/stderr
/// (see [`parse_line`]); per-item errors are collected from `ERROR:` lines.
///
/// # Examples
///
/// ```no_run
/// use media_dl::engine::YtDlpEngine;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let engine = YtDlpEngine::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or discovered in PATH
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not in PATH");
/// ```
pub struct YtDlpEngine {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    extra_args: Vec<String>,
}

impl YtDlpEngine {
    /// Create an engine with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_path: None,
            extra_args: Vec::new(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Use a specific ffmpeg binary (or directory) for transcoding
    pub fn with_ffmpeg(mut self, ffmpeg_path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }

    /// Extra arguments appended before the URL
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Path of the binary this engine runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Build the full argument list for one request
    pub fn build_args(&self, url: &str, config: &EngineConfig) -> Vec<String> {
        let mut args: Vec<String> = [
            "--newline",
            "--progress",
            "--no-simulate",
            "--no-colors",
            "--windows-filenames",
            "--progress-template",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("download:{PROGRESS_PREFIX}%(progress)j"));
        args.push("--print".into());
        args.push(format!(
            "after_move:{ARTIFACT_PREFIX}%(.{{title,filepath,playlist_title}})j"
        ));

        args.push("-f".into());
        args.push(config.format.clone());
        args.push("-o".into());
        args.push(config.output.to_engine_template());

        if config.playlist {
            args.push("--print".into());
            args.push(format!("playlist:{PLAYLIST_DONE_PREFIX}%(title)j"));
            args.push("--yes-playlist".into());
        } else {
            args.push("--no-playlist".into());
        }
        if config.ignore_item_errors {
            args.push("--ignore-errors".into());
        }

        if let Some(PostProcess::ExtractAudio {
            codec,
            bitrate_kbps,
        }) = config.post_process
        {
            args.push("-x".into());
            args.push("--audio-format".into());
            args.push(codec.as_str().into());
            args.push("--audio-quality".into());
            args.push(format!("{bitrate_kbps}K"));
        }

        if let Some(ffmpeg) = &self.ffmpeg_path {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push("--".into());
        args.push(url.to_string());
        args
    }
}

/// Accumulates what the engine printed while running
#[derive(Default)]
struct RunState {
    output: EngineOutput,
    playlist_done: bool,
    last_error: Option<String>,
    stderr_tail: VecDeque<String>,
}

impl RunState {
    fn handle(&mut self, line: &str, from_stderr: bool, on_progress: ProgressCallback<'_>) {
        match parse_line(line) {
            EngineLine::Progress(raw) => on_progress(raw),
            EngineLine::Artifact(artifact) => {
                if artifact.title.is_some() {
                    self.output.title = artifact.title.clone();
                }
                if artifact.playlist_title.is_some() {
                    self.output.playlist_title = artifact.playlist_title.clone();
                }
                if let Some(path) = artifact.filepath {
                    self.output.files.push(path);
                }
            }
            EngineLine::PlaylistDone(title) => {
                self.playlist_done = true;
                if self.output.playlist_title.is_none() {
                    self.output.playlist_title = title;
                }
            }
            EngineLine::Error(message) => {
                tracing::debug!(error = %message, "yt-dlp reported an error");
                self.output.item_errors.push(message.clone());
                self.last_error = Some(message);
            }
            EngineLine::Other => {
                tracing::trace!(line, "yt-dlp output");
                if from_stderr {
                    self.stderr_tail.push_back(line.to_string());
                    if self.stderr_tail.len() > STDERR_TAIL_LINES {
                        self.stderr_tail.pop_front();
                    }
                }
            }
        }
    }

    fn failure_message(&self) -> String {
        if let Some(message) = &self.last_error {
            return message.clone();
        }
        let tail: Vec<&str> = self
            .stderr_tail
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if tail.is_empty() {
            "yt-dlp exited without reporting an error".to_string()
        } else {
            tail.join("\n")
        }
    }
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    async fn fetch(
        &self,
        url: &str,
        config: &EngineConfig,
        on_progress: ProgressCallback<'_>,
    ) -> Result<EngineOutput, EngineError> {
        let args = self.build_args(url, config);
        tracing::debug!(binary = %self.binary_path.display(), ?args, "Starting yt-dlp");

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                binary: self.binary_path.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("stderr not captured")))?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut state = RunState::default();

        // Drain both pipes in arrival order until the process closes them
        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => match line? {
                    Some(line) => state.handle(&line, false, on_progress),
                    None => stdout_done = true,
                },
                line = stderr_lines.next_line(), if !stderr_done => match line? {
                    Some(line) => state.handle(&line, true, on_progress),
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await?;

        if state.output.title.is_none() && state.output.playlist_title.is_none() {
            tracing::debug!("yt-dlp printed no title");
        }

        if status.success() {
            return Ok(state.output);
        }

        // With --ignore-errors yt-dlp still exits non-zero when any entry failed.
        // The playlist marker means the top-level call itself went through.
        if config.ignore_item_errors && status.code().is_some() && state.playlist_done {
            tracing::warn!(
                skipped = state.output.item_errors.len(),
                "yt-dlp finished with skipped items"
            );
            return Ok(state.output);
        }

        Err(EngineError::Failed {
            exit_code: status.code(),
            message: state.failure_message(),
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
