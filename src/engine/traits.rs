//! Traits and types for the fetch engine boundary

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::profile::EngineConfig;
use crate::progress::RawProgress;

/// Callback receiving raw progress payloads, in the order the engine emits them
pub type ProgressCallback<'a> = &'a (dyn Fn(RawProgress) + Send + Sync);

/// What the engine reports after a completed call
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// Media title (of the last item in playlist mode)
    pub title: Option<String>,
    /// Playlist title, in playlist mode
    pub playlist_title: Option<String>,
    /// Final files written, in completion order
    pub files: Vec<PathBuf>,
    /// Errors for playlist items that were skipped
    pub item_errors: Vec<String>,
}

/// Faults raised by an engine
///
/// These never leave the worker: they are classified into a
/// [`FailureKind`](crate::types::FailureKind) and recorded on the job.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine is installed or configured
    #[error("engine not available: {0}")]
    NotAvailable(String),

    /// The engine process could not be started
    #[error("failed to start {binary}: {source}")]
    Spawn {
        /// Binary that was executed
        binary: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while talking to the engine
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine ran and reported failure
    #[error("{message}")]
    Failed {
        /// Process exit code, if it exited normally
        exit_code: Option<i32>,
        /// Last error reported by the engine
        message: String,
    },
}

/// Trait for media fetch engines
///
/// Implementations retrieve `url` according to `config`, invoke `on_progress`
/// for every raw progress payload and return once the whole request (every
/// playlist entry, in playlist mode) has been processed. The call may take
/// arbitrarily long; callers run it on its own task.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetch and, if requested, transcode the media at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be started, or if the request
    /// failed. In playlist mode with `ignore_item_errors`, individual entry
    /// failures are reported in [`EngineOutput::item_errors`] instead.
    async fn fetch(
        &self,
        url: &str,
        config: &EngineConfig,
        on_progress: ProgressCallback<'_>,
    ) -> Result<EngineOutput, EngineError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
