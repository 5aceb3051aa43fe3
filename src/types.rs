//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::profile::Profile;
use crate::progress::ProgressEvent;

/// Unique identifier for a job
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job lifecycle state
///
/// `Queued -> Running -> (Succeeded | Failed)`. The last two are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, worker not yet handed off to the engine
    Queued,
    /// Engine invocation in progress
    Running,
    /// Engine call returned without error
    Succeeded,
    /// Engine call failed
    Failed,
}

impl JobState {
    /// Whether the state can never be left again
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Running)
                | (JobState::Queued, JobState::Failed)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Classification of a job failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, DNS, timeout or server-side HTTP failure
    Network,
    /// URL not recognized, or content removed/private/unavailable
    UnsupportedSource,
    /// Output could not be written
    Filesystem,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Network => "network error",
            FailureKind::UnsupportedSource => "unsupported source",
            FailureKind::Filesystem => "filesystem error",
            FailureKind::Unknown => "unknown error",
        };
        f.write_str(s)
    }
}

/// Details of a successful job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Resolved media title (playlist title in playlist mode)
    pub title: String,
    /// Final output file, or the playlist directory in playlist mode
    pub path: PathBuf,
    /// Playlist items the engine skipped after an error
    #[serde(default)]
    pub skipped_items: usize,
}

/// Details of a failed job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable message from the engine
    pub message: String,
}

/// Terminal result of a job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum JobResult {
    /// Job succeeded
    Succeeded(JobOutcome),
    /// Job failed
    Failed(JobFailure),
}

impl JobResult {
    /// The terminal state this result puts a job in
    pub fn state(&self) -> JobState {
        match self {
            JobResult::Succeeded(_) => JobState::Succeeded,
            JobResult::Failed(_) => JobState::Failed,
        }
    }
}

/// Snapshot of one submitted job
///
/// Always a copy; mutating it has no effect on the job table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier
    pub id: JobId,
    /// Source URL as submitted
    pub url: String,
    /// Requested output profile
    pub profile: Profile,
    /// Current lifecycle state
    pub state: JobState,
    /// Latest progress, absent until the first transfer event
    pub progress: Option<ProgressEvent>,
    /// Present once the job is terminal
    pub result: Option<JobResult>,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
    /// When the worker handed off to the engine
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub(crate) fn new(id: JobId, url: String, profile: Profile) -> Self {
        Self {
            id,
            url,
            profile,
            state: JobState::Queued,
            progress: None,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted and added to the table
    Queued {
        /// Job ID
        id: JobId,
        /// Source URL
        url: String,
        /// Requested profile
        profile: Profile,
    },

    /// Worker handed off to the engine
    Started {
        /// Job ID
        id: JobId,
    },

    /// Transfer progress update
    Progress {
        /// Job ID
        id: JobId,
        /// Latest progress snapshot
        progress: ProgressEvent,
    },

    /// Job finished successfully
    Succeeded {
        /// Job ID
        id: JobId,
        /// Resolved title
        title: String,
        /// Output path
        path: PathBuf,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// Failure category
        kind: FailureKind,
        /// Error message
        error: String,
    },

    /// Artifact list was rescanned after a job finished
    ArtifactsRefreshed {
        /// Number of artifacts found
        count: usize,
    },

    /// Graceful shutdown completed
    Shutdown,
}

impl Event {
    /// Job this event refers to, if any
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Event::Queued { id, .. }
            | Event::Started { id }
            | Event::Progress { id, .. }
            | Event::Succeeded { id, .. }
            | Event::Failed { id, .. } => Some(*id),
            Event::ArtifactsRefreshed { .. } | Event::Shutdown => None,
        }
    }
}
