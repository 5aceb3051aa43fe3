//! Per-job worker: resolves the profile, runs the engine, reports back.
//!
//! A worker owns nothing shared except the update channel. Every state change
//! goes to the updater task, which is the only writer of the job table.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::{Semaphore, mpsc};

use crate::engine::{EngineError, EngineOutput, FetchEngine};
use crate::profile::{self, EngineConfig, FALLBACK_TITLE, Profile};
use crate::progress::{RawProgress, translate};
use crate::types::{FailureKind, JobFailure, JobId, JobOutcome, JobResult};

use super::updater::{JobChange, JobUpdate};

/// Everything one worker needs, detached from `MediaDownloader`
pub(crate) struct WorkerContext {
    pub(crate) id: JobId,
    pub(crate) url: String,
    pub(crate) profile: Profile,
    pub(crate) output_dir: PathBuf,
    pub(crate) engine: Arc<dyn FetchEngine>,
    pub(crate) update_tx: mpsc::UnboundedSender<JobUpdate>,
    pub(crate) concurrent_limit: Option<Arc<Semaphore>>,
}

impl WorkerContext {
    fn send(&self, change: JobChange) {
        // The updater only stops when the downloader is gone
        if self.update_tx.send(JobUpdate::change(self.id, change)).is_err() {
            tracing::debug!(job_id = %self.id, "Updater gone, dropping job update");
        }
    }
}

/// Run one job to completion
pub(crate) async fn run_job(ctx: WorkerContext) {
    let _permit = match ctx.concurrent_limit.clone() {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                ctx.send(JobChange::Finished(JobResult::Failed(JobFailure {
                    kind: FailureKind::Unknown,
                    message: "Job slot pool closed before the job could start".to_string(),
                })));
                return;
            }
        },
        None => None,
    };

    let config = profile::resolve(ctx.profile, &ctx.output_dir);
    tracing::info!(
        job_id = %ctx.id,
        url = %ctx.url,
        profile = %ctx.profile,
        format = %config.format,
        engine = ctx.engine.name(),
        "Starting job"
    );
    ctx.send(JobChange::Started);

    let on_progress = |raw: RawProgress| {
        if let Some(event) = translate(&raw) {
            ctx.send(JobChange::Progress(event));
        }
    };

    let result = match ctx.engine.fetch(&ctx.url, &config, &on_progress).await {
        Ok(output) => {
            let outcome = outcome_from(output, &config);
            tracing::info!(
                job_id = %ctx.id,
                title = %outcome.title,
                path = %outcome.path.display(),
                skipped_items = outcome.skipped_items,
                "Job succeeded"
            );
            JobResult::Succeeded(outcome)
        }
        Err(e) => {
            let failure = classify_failure(&e);
            tracing::error!(
                job_id = %ctx.id,
                kind = %failure.kind,
                error = %failure.message,
                "Job failed"
            );
            JobResult::Failed(failure)
        }
    };

    ctx.send(JobChange::Finished(result));
}

/// Build the success record from what the engine reported
///
/// In playlist mode the title is the playlist's and the path is the playlist
/// directory; otherwise the title is the item's and the path the last file
/// written (the post-processed one when extraction ran).
fn outcome_from(output: EngineOutput, config: &EngineConfig) -> JobOutcome {
    if config.playlist {
        let title = output
            .playlist_title
            .clone()
            .or_else(|| output.title.clone())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let path = output
            .files
            .first()
            .and_then(|f| f.parent())
            .map(Path::to_path_buf)
            .or_else(|| {
                config
                    .output
                    .render(None, output.playlist_title.as_deref(), "")
                    .parent()
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| config.output.dir.clone());

        JobOutcome {
            title,
            path,
            skipped_items: output.item_errors.len(),
        }
    } else {
        let title = output
            .title
            .clone()
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let path = output
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| config.output.dir.clone());

        JobOutcome {
            title,
            path,
            skipped_items: 0,
        }
    }
}

static FILESYSTEM_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)no space left|disk quota|permission denied|read-only file system|unable to open for writing|unable to create directory|file name too long|errno 28|errno 13",
    )
    .ok()
});

static UNSUPPORTED_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)unsupported url|is not a valid url|video unavailable|private video|has been removed|members-only|sign in to confirm your age|no video formats found|requested format is not available|http error 40[34]|http error 410",
    )
    .ok()
});

static NETWORK_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)unable to download webpage|unable to connect|connection (refused|reset|aborted)|timed out|temporary failure in name resolution|name or service not known|getaddrinfo|network is unreachable|no route to host|remote end closed|incompleteread|ssl|http error (429|5\d\d)",
    )
    .ok()
});

fn pattern_matches(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Map an engine error onto a failure category
///
/// Engine output is inspected in order: filesystem problems first (they can
/// surface inside download errors), then dead or unsupported sources, then
/// transport errors. Anything else is [`FailureKind::Unknown`].
pub fn classify_failure(error: &EngineError) -> JobFailure {
    let kind = match error {
        EngineError::NotAvailable(_) | EngineError::Spawn { .. } => FailureKind::Unknown,
        EngineError::Io(e) => match e.kind() {
            std::io::ErrorKind::PermissionDenied
            | std::io::ErrorKind::StorageFull
            | std::io::ErrorKind::ReadOnlyFilesystem => FailureKind::Filesystem,
            _ => FailureKind::Unknown,
        },
        EngineError::Failed { message, .. } => classify_message(message),
    };

    JobFailure {
        kind,
        message: error.to_string(),
    }
}

fn classify_message(message: &str) -> FailureKind {
    if pattern_matches(&FILESYSTEM_PATTERN, message) {
        FailureKind::Filesystem
    } else if pattern_matches(&UNSUPPORTED_PATTERN, message) {
        FailureKind::UnsupportedSource
    } else if pattern_matches(&NETWORK_PATTERN, message) {
        FailureKind::Network
    } else {
        FailureKind::Unknown
    }
}
