//! Job submission and snapshot queries

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::{Error, JobError, Result};
use crate::profile::Profile;
use crate::types::{Event, Job, JobId, JobState};

use super::MediaDownloader;
use super::worker::{self, WorkerContext};

impl MediaDownloader {
    /// Submit a URL for download with the given profile
    ///
    /// Returns as soon as the job is recorded; the work itself runs on its own
    /// task. The returned id is unique for the lifetime of this downloader.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `url` is empty or whitespace-only
    /// - [`Error::ShuttingDown`] if [`shutdown`](Self::shutdown) has been called
    pub async fn submit(&self, url: &str, profile: Profile) -> Result<JobId> {
        if !self.queue_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("URL must not be empty".to_string()));
        }

        let id = JobId(self.queue_state.next_id.fetch_add(1, Ordering::SeqCst));
        self.queue_state
            .table
            .write()
            .await
            .insert(Job::new(id, url.to_string(), profile));

        tracing::info!(job_id = %id, url, %profile, "Job queued");
        self.emit_event(Event::Queued {
            id,
            url: url.to_string(),
            profile,
        });

        let ctx = WorkerContext {
            id,
            url: url.to_string(),
            profile,
            output_dir: self.config.download.output_dir.clone(),
            engine: Arc::clone(&self.engine),
            update_tx: self.queue_state.update_tx.clone(),
            concurrent_limit: self.queue_state.concurrent_limit.clone(),
        };
        self.queue_state.workers.spawn(worker::run_job(ctx));

        Ok(id)
    }

    /// Submit with a profile token such as `"720p"` or `"audio"`
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedProfile`] for an unknown token, otherwise as
    /// [`submit`](Self::submit).
    pub async fn submit_with_token(&self, url: &str, profile: &str) -> Result<JobId> {
        let profile: Profile = profile.parse()?;
        self.submit(url, profile).await
    }

    /// Snapshot of one job
    ///
    /// # Errors
    ///
    /// [`JobError::NotFound`] if no job has this id.
    pub async fn get_job(&self, id: JobId) -> Result<Job> {
        self.queue_state
            .table
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(Error::Job(JobError::NotFound { id: id.get() }))
    }

    /// Snapshot of every job, in submission order
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.queue_state.table.read().await.snapshot()
    }

    /// Jobs currently in `state`, in submission order
    pub async fn jobs_in_state(&self, state: JobState) -> Vec<Job> {
        self.list_jobs()
            .await
            .into_iter()
            .filter(|job| job.state == state)
            .collect()
    }

    /// Wait until every submitted job has reached a terminal state
    ///
    /// Jobs submitted while waiting are waited for as well.
    pub async fn wait_idle(&self) {
        let workers = &self.queue_state.workers;
        workers.close();
        workers.wait().await;
        {
            // Once shutdown has closed the tracker it stays closed
            let _gate = self.queue_state.tracker_gate.lock().await;
            if self.queue_state.accepting_new.load(Ordering::SeqCst) {
                workers.reopen();
            }
        }
        self.flush_updates().await;
    }
}
