//! Error types for media-dl
//!
//! Two kinds of failure exist in this crate:
//! - [`Error`] is returned synchronously from the downloader API (bad input,
//!   unknown job, invalid configuration, shutdown in progress).
//! - Job failures are never returned as errors; they are recorded as data on
//!   the job (see [`crate::types::JobFailure`]) once the submission has already
//!   returned.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// Submission rejected before a job was created (e.g. empty URL)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Profile token did not name a known profile
    #[error("unsupported profile: {0}")]
    UnsupportedProfile(String),

    /// Job-related error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Fetch engine error
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output directory could not be scanned
    #[error("failed to scan {path}: {reason}")]
    RegistryScan {
        /// Directory that was being scanned
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Job table errors
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this id was ever submitted
    #[error("job {id} not found")]
    NotFound {
        /// The job id that was not found
        id: u64,
    },
}

impl Error {
    /// Machine-readable error code for presentation layers
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::UnsupportedProfile(_) => "unsupported_profile",
            Error::Job(JobError::NotFound { .. }) => "job_not_found",
            Error::Engine(_) => "engine_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::RegistryScan { .. } => "registry_scan_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether the caller can fix this by changing its input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UnsupportedProfile(_)
                | Error::Job(JobError::NotFound { .. })
        )
    }
}
