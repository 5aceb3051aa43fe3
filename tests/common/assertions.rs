//! Waiting and assertion helpers

use std::time::Duration;

use media_dl::{Event, Job, JobId, MediaDownloader};
use tokio::sync::broadcast;

/// Collect every event for `id` up to and including its terminal event
pub async fn collect_job_events(
    rx: &mut broadcast::Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> Vec<Event> {
    let mut events = Vec::new();
    let result = tokio::time::timeout(timeout, async {
        loop {
            match rx.recv().await {
                Ok(event) if event.job_id() == Some(id) => {
                    let terminal =
                        matches!(event, Event::Succeeded { .. } | Event::Failed { .. });
                    events.push(event);
                    if terminal {
                        return;
                    }
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
    .await;
    assert!(result.is_ok(), "job {id} did not finish within {timeout:?}");
    events
}

/// Wait for all jobs, then return the snapshot of `id`
pub async fn finished_job(downloader: &MediaDownloader, id: JobId) -> Job {
    downloader.wait_idle().await;
    let job = downloader.get_job(id).await.expect("job should exist");
    assert!(job.state.is_terminal(), "job {id} still {:?}", job.state);
    job
}
