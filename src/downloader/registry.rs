//! Artifact listing and the refresh that follows every finished job

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};

use crate::artifacts::{Artifact, ArtifactRegistry};
use crate::types::Event;

use super::MediaDownloader;

/// Registry plus the snapshot taken at the last refresh
///
/// Held separately from [`MediaDownloader`] so the updater task can trigger a
/// refresh without owning the downloader.
#[derive(Clone)]
pub(crate) struct ArtifactRefresher {
    registry: ArtifactRegistry,
    limit: usize,
    recent: Arc<RwLock<Vec<Artifact>>>,
    /// Held from scan start to store, so a later scan is never overwritten
    /// by an earlier one
    refresh_lock: Arc<Mutex<()>>,
    event_tx: broadcast::Sender<Event>,
}

impl ArtifactRefresher {
    pub(crate) fn new(
        registry: ArtifactRegistry,
        limit: usize,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            registry,
            limit,
            recent: Arc::new(RwLock::new(Vec::new())),
            refresh_lock: Arc::new(Mutex::new(())),
            event_tx,
        }
    }

    /// Rescan in the background
    pub(crate) fn spawn_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            this.refresh().await;
        });
    }

    /// Rescan the output directory, store the snapshot and announce it
    ///
    /// Refreshes run one at a time in call order.
    pub(crate) async fn refresh(&self) -> Vec<Artifact> {
        let _guard = self.refresh_lock.lock().await;
        let artifacts = scan_recent(self.registry.clone(), self.limit).await;
        *self.recent.write().await = artifacts.clone();

        tracing::debug!(count = artifacts.len(), "Artifact list refreshed");
        self.event_tx
            .send(Event::ArtifactsRefreshed {
                count: artifacts.len(),
            })
            .ok();
        artifacts
    }
}

/// Directory walk on the blocking pool
async fn scan_recent(registry: ArtifactRegistry, limit: usize) -> Vec<Artifact> {
    match tokio::task::spawn_blocking(move || registry.list_recent(limit)).await {
        Ok(artifacts) => artifacts,
        Err(e) => {
            tracing::warn!(error = %e, "Artifact scan task failed");
            Vec::new()
        }
    }
}

impl MediaDownloader {
    /// The `limit` most recently modified media files in the output directory
    ///
    /// Scans the directory now. An unreadable directory yields an empty list.
    pub async fn list_recent(&self, limit: usize) -> Vec<Artifact> {
        scan_recent(self.artifacts.registry.clone(), limit).await
    }

    /// Snapshot from the last automatic refresh
    ///
    /// Refreshed at startup and after every job reaches a terminal state,
    /// holding at most `recent_limit` entries.
    pub async fn recent_artifacts(&self) -> Vec<Artifact> {
        self.artifacts.recent.read().await.clone()
    }

    /// Rescan now, update the snapshot and emit [`Event::ArtifactsRefreshed`]
    pub async fn refresh_artifacts(&self) -> Vec<Artifact> {
        self.artifacts.refresh().await
    }

    /// Output directory being listed
    pub fn output_dir(&self) -> &Path {
        self.artifacts.registry.root()
    }

    /// Open the output directory in the platform file manager
    ///
    /// Returns `false` if the directory is missing or no file manager could be
    /// launched.
    pub async fn reveal_output_dir(&self) -> bool {
        crate::shell::reveal_dir(self.output_dir()).await
    }
}
