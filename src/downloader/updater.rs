//! Job table and the single task that applies worker updates to it.
//!
//! Workers never touch the table directly. They send [`JobUpdate`]s over an
//! unbounded channel and this task applies them one at a time, so the state
//! of a job only moves forward (`Queued -> Running -> Succeeded | Failed`)
//! no matter how updates from different workers interleave.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot};

use crate::progress::ProgressEvent;
use crate::types::{Event, Job, JobId, JobResult, JobState};

use super::MediaDownloader;
use super::registry::ArtifactRefresher;

/// All jobs ever submitted
///
/// Keyed by id; ids are handed out in increasing order, so iteration order is
/// submission order.
#[derive(Debug, Default)]
pub(crate) struct JobTable {
    jobs: BTreeMap<JobId, Job>,
}

impl JobTable {
    pub(crate) fn insert(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// Clones of every job, in submission order
    pub(crate) fn snapshot(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    /// Apply one worker update
    ///
    /// Returns the event to publish, or `None` if the update was stale
    /// (unknown job, illegal transition, progress outside `Running`).
    pub(crate) fn apply(&mut self, id: JobId, change: JobChange) -> Option<Event> {
        let Some(job) = self.jobs.get_mut(&id) else {
            tracing::warn!(job_id = %id, "Update for unknown job dropped");
            return None;
        };

        match change {
            JobChange::Started => {
                if !job.state.can_transition_to(JobState::Running) {
                    tracing::debug!(job_id = %id, state = ?job.state, "Ignoring late start");
                    return None;
                }
                job.state = JobState::Running;
                job.started_at = Some(chrono::Utc::now());
                Some(Event::Started { id })
            }
            JobChange::Progress(progress) => {
                if job.state != JobState::Running {
                    return None;
                }
                // Fraction never goes backwards while a job runs
                let progress = match &job.progress {
                    Some(stored) => progress.not_below(stored),
                    None => progress,
                };
                job.progress = Some(progress.clone());
                Some(Event::Progress { id, progress })
            }
            JobChange::Finished(result) => {
                let next = result.state();
                if !job.state.can_transition_to(next) {
                    tracing::warn!(
                        job_id = %id,
                        from = ?job.state,
                        to = ?next,
                        "Ignoring illegal state transition"
                    );
                    return None;
                }
                job.state = next;
                job.finished_at = Some(chrono::Utc::now());

                let event = match &result {
                    JobResult::Succeeded(outcome) => Event::Succeeded {
                        id,
                        title: outcome.title.clone(),
                        path: outcome.path.clone(),
                    },
                    JobResult::Failed(failure) => Event::Failed {
                        id,
                        kind: failure.kind,
                        error: failure.message.clone(),
                    },
                };
                job.result = Some(result);
                Some(event)
            }
        }
    }
}

/// A state change reported by a worker
#[derive(Debug)]
pub(crate) enum JobChange {
    Started,
    Progress(ProgressEvent),
    Finished(JobResult),
}

/// Message on the worker -> updater channel
#[derive(Debug)]
pub(crate) enum JobUpdate {
    /// Apply a change to one job
    Change { id: JobId, change: JobChange },
    /// Reply once every update sent before this one has been applied
    Flush(oneshot::Sender<()>),
}

impl JobUpdate {
    pub(crate) fn change(id: JobId, change: JobChange) -> Self {
        JobUpdate::Change { id, change }
    }
}

impl MediaDownloader {
    /// Spawn the updater task
    ///
    /// The task owns no `MediaDownloader` clone (that would keep the update
    /// channel open forever); it exits when the last sender is dropped.
    pub(crate) fn spawn_updater(&self, mut update_rx: mpsc::UnboundedReceiver<JobUpdate>) {
        let table: Arc<RwLock<JobTable>> = Arc::clone(&self.queue_state.table);
        let event_tx = self.event_tx.clone();
        let artifacts: ArtifactRefresher = self.artifacts.clone();

        tokio::spawn(async move {
            while let Some(update) = update_rx.recv().await {
                match update {
                    JobUpdate::Change { id, change } => {
                        let event = table.write().await.apply(id, change);
                        let Some(event) = event else { continue };

                        let terminal = matches!(
                            event,
                            Event::Succeeded { .. } | Event::Failed { .. }
                        );
                        event_tx.send(event).ok();

                        if terminal {
                            artifacts.spawn_refresh();
                        }
                    }
                    JobUpdate::Flush(ack) => {
                        ack.send(()).ok();
                    }
                }
            }
            tracing::debug!("Job updater stopped");
        });
    }

    /// Wait until every update already sent by workers has been applied
    pub(crate) async fn flush_updates(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.queue_state.update_tx.send(JobUpdate::Flush(ack_tx)).is_ok() {
            ack_rx.await.ok();
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::progress::{RawProgress, translate};
    use crate::types::{FailureKind, JobFailure, JobOutcome};

    fn table_with_job(id: u64) -> JobTable {
        let mut table = JobTable::default();
        table.insert(Job::new(JobId(id), "https://x/v".into(), Profile::P720));
        table
    }

    fn progress(downloaded: f64) -> ProgressEvent {
        translate(&RawProgress::Downloading {
            downloaded_bytes: Some(downloaded),
            total_bytes: Some(100.0),
            total_bytes_estimate: None,
            speed: None,
            filename: None,
        })
        .unwrap()
    }

    fn success() -> JobResult {
        JobResult::Succeeded(JobOutcome {
            title: "Clip".into(),
            path: "/out/Clip.mp4".into(),
            skipped_items: 0,
        })
    }

    #[test]
    fn snapshot_preserves_submission_order() {
        let mut table = JobTable::default();
        for id in [1, 2, 10, 3] {
            table.insert(Job::new(JobId(id), format!("u{id}"), Profile::P360));
        }
        let ids: Vec<u64> = table.snapshot().iter().map(|j| j.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 10]);
    }

    #[test]
    fn progress_before_start_is_dropped() {
        let mut table = table_with_job(1);
        assert!(table.apply(JobId(1), JobChange::Progress(progress(10.0))).is_none());
        assert!(table.get(JobId(1)).unwrap().progress.is_none());
    }

    #[test]
    fn progress_never_moves_backwards() {
        let mut table = table_with_job(1);
        table.apply(JobId(1), JobChange::Started).unwrap();
        table.apply(JobId(1), JobChange::Progress(progress(60.0))).unwrap();

        let event = table
            .apply(JobId(1), JobChange::Progress(progress(20.0)))
            .unwrap();
        match event {
            Event::Progress { progress, .. } => {
                assert_eq!(progress.fraction, 0.6);
                assert_eq!(progress.downloaded_bytes, 60);
            }
            other => panic!("Expected progress event, got {other:?}"),
        }
        let stored = table.get(JobId(1)).unwrap().progress.clone().unwrap();
        assert_eq!(stored.fraction, 0.6);
        assert_eq!(stored.downloaded_bytes, 60);
        assert_eq!(stored.total_bytes, 100);
    }

    #[test]
    fn terminal_state_is_final() {
        let mut table = table_with_job(1);
        table.apply(JobId(1), JobChange::Started).unwrap();
        assert!(matches!(
            table.apply(JobId(1), JobChange::Finished(success())),
            Some(Event::Succeeded { .. })
        ));

        let failure = JobResult::Failed(JobFailure {
            kind: FailureKind::Network,
            message: "late".into(),
        });
        assert!(table.apply(JobId(1), JobChange::Finished(failure)).is_none());
        assert!(table.apply(JobId(1), JobChange::Started).is_none());
        assert!(table.apply(JobId(1), JobChange::Progress(progress(99.0))).is_none());

        let job = table.get(JobId(1)).unwrap();
        assert_eq!(job.state, JobState::Succeeded);
        assert!(job.started_at.is_some());
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn success_cannot_skip_running() {
        let mut table = table_with_job(1);
        assert!(table.apply(JobId(1), JobChange::Finished(success())).is_none());
        assert_eq!(table.get(JobId(1)).unwrap().state, JobState::Queued);
    }

    #[test]
    fn queued_job_may_fail_directly() {
        let mut table = table_with_job(1);
        let failure = JobResult::Failed(JobFailure {
            kind: FailureKind::Unknown,
            message: "no slot".into(),
        });
        assert!(matches!(
            table.apply(JobId(1), JobChange::Finished(failure)),
            Some(Event::Failed { kind: FailureKind::Unknown, .. })
        ));
    }

    #[test]
    fn unknown_job_is_ignored() {
        let mut table = table_with_job(1);
        assert!(table.apply(JobId(7), JobChange::Started).is_none());
    }
}
