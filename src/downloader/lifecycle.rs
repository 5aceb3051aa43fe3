//! Shutdown coordination.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::error::Result;
use crate::types::{Event, JobState};

use super::MediaDownloader;

/// How long shutdown waits for in-flight jobs
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs (`submit` returns [`Error::ShuttingDown`](crate::Error::ShuttingDown))
    /// 2. Waits up to 30 seconds for queued and running jobs to finish
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Jobs are never interrupted. Any still running when the timeout expires
    /// keep their engine process and finish in the background.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new jobs and close the tracker together, so a
        //    concurrent wait_idle cannot reopen it
        let workers = &self.queue_state.workers;
        {
            let _gate = self.queue_state.tracker_gate.lock().await;
            self.queue_state.accepting_new.store(false, Ordering::SeqCst);
            workers.close();
        }
        tracing::info!("Stopped accepting new jobs");

        // 2. Wait for workers with timeout
        tracing::debug!(in_flight = workers.len(), "Waiting for workers");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, workers.wait()).await {
            Ok(()) => {
                self.flush_updates().await;
                tracing::info!("All jobs completed");
            }
            Err(_) => {
                let unfinished = self
                    .list_jobs()
                    .await
                    .iter()
                    .filter(|job| !job.state.is_terminal())
                    .count();
                tracing::warn!(
                    unfinished,
                    "Timeout waiting for jobs to complete, proceeding with shutdown"
                );
            }
        }

        // 3. Emit shutdown event
        self.emit_event(Event::Shutdown);

        let running = self.jobs_in_state(JobState::Running).await.len();
        tracing::info!(
            running,
            "Graceful shutdown complete"
        );
        Ok(())
    }

    /// Whether new submissions are still accepted
    pub fn is_accepting(&self) -> bool {
        self.queue_state.accepting_new.load(Ordering::SeqCst)
    }
}
