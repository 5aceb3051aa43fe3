//! Shared test helpers for creating MediaDownloader instances in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::sync::Notify;

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::engine::{EngineError, EngineOutput, FetchEngine, ProgressCallback};
use crate::profile::EngineConfig;
use crate::progress::RawProgress;
use crate::types::{Event, JobId};

/// What a scripted fetch ends with
#[derive(Clone, Debug)]
pub(crate) enum MockOutcome {
    /// Write `<title>.<ext>` into the output directory
    Success { title: String, ext: String },
    /// Playlist: entries with `Ok(title)` are written, `Err(msg)` are skipped
    Playlist {
        title: String,
        entries: Vec<Result<String, String>>,
    },
    /// Exit with this engine error text
    Fail(String),
}

/// Script for one URL
#[derive(Clone, Debug)]
pub(crate) struct MockScript {
    pub(crate) progress: Vec<RawProgress>,
    pub(crate) outcome: MockOutcome,
    /// Fetch blocks on this after reporting progress
    pub(crate) gate: Option<Arc<Notify>>,
}

impl MockScript {
    pub(crate) fn success(title: &str) -> Self {
        Self {
            progress: vec![downloading(50, 100), downloading(100, 100)],
            outcome: MockOutcome::Success {
                title: title.to_string(),
                ext: "mp4".to_string(),
            },
            gate: None,
        }
    }

    pub(crate) fn failure(message: &str) -> Self {
        Self {
            progress: Vec::new(),
            outcome: MockOutcome::Fail(message.to_string()),
            gate: None,
        }
    }

    pub(crate) fn with_progress(mut self, progress: Vec<RawProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Raw `downloading` payload with an exact total
pub(crate) fn downloading(downloaded: u64, total: u64) -> RawProgress {
    RawProgress::Downloading {
        downloaded_bytes: Some(downloaded as f64),
        total_bytes: Some(total as f64),
        total_bytes_estimate: None,
        speed: Some(1024.0 * 1024.0),
        filename: None,
    }
}

/// Engine that replays per-URL scripts instead of running yt-dlp
///
/// URLs without a script succeed with a title derived from the URL.
#[derive(Default)]
pub(crate) struct MockEngine {
    scripts: Mutex<HashMap<String, MockScript>>,
    calls: Mutex<Vec<(String, EngineConfig)>>,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, url: &str, script: MockScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), script);
    }

    /// Every (url, config) the engine was asked to fetch
    pub(crate) fn calls(&self) -> Vec<(String, EngineConfig)> {
        self.calls.lock().unwrap().clone()
    }

    fn script_for(&self, url: &str) -> MockScript {
        self.scripts
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                let title = url.rsplit('/').next().unwrap_or("clip").to_string();
                MockScript::success(&title)
            })
    }
}

#[async_trait]
impl FetchEngine for MockEngine {
    async fn fetch(
        &self,
        url: &str,
        config: &EngineConfig,
        on_progress: ProgressCallback<'_>,
    ) -> Result<EngineOutput, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), config.clone()));
        let script = self.script_for(url);

        for raw in script.progress {
            on_progress(raw);
            tokio::task::yield_now().await;
        }

        if let Some(gate) = script.gate {
            gate.notified().await;
        }

        match script.outcome {
            MockOutcome::Success { title, ext } => {
                let path = config.output.render(Some(&title), None, &ext);
                tokio::fs::write(&path, b"media").await?;
                Ok(EngineOutput {
                    title: Some(title),
                    playlist_title: None,
                    files: vec![path],
                    item_errors: Vec::new(),
                })
            }
            MockOutcome::Playlist { title, entries } => {
                let mut output = EngineOutput {
                    playlist_title: Some(title.clone()),
                    ..EngineOutput::default()
                };
                for entry in entries {
                    match entry {
                        Ok(item) => {
                            let path = config.output.render(Some(&item), Some(&title), "mp4");
                            if let Some(parent) = path.parent() {
                                tokio::fs::create_dir_all(parent).await?;
                            }
                            tokio::fs::write(&path, b"media").await?;
                            output.title = Some(item);
                            output.files.push(path);
                        }
                        Err(message) => output.item_errors.push(message),
                    }
                }
                // The playlist call completed, whatever happened to its entries
                Ok(output)
            }
            MockOutcome::Fail(message) => Err(EngineError::Failed {
                exit_code: Some(1),
                message,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a test MediaDownloader over a temp output directory.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    engine: Arc<MockEngine>,
) -> (MediaDownloader, tempfile::TempDir) {
    create_test_downloader_with(engine, |_| {}).await
}

/// Like [`create_test_downloader`], with a hook to adjust the config
pub(crate) async fn create_test_downloader_with(
    engine: Arc<MockEngine>,
    adjust: impl FnOnce(&mut Config),
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.output_dir = temp_dir.path().join("downloads");
    config.tools.search_path = false;
    adjust(&mut config);

    let downloader = MediaDownloader::with_engine(config, engine).await.unwrap();
    (downloader, temp_dir)
}

/// Collect events for `id` until it reaches a terminal state
pub(crate) async fn events_until_terminal(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    id: JobId,
) -> Vec<Event> {
    let mut events = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.unwrap();
            if event.job_id() != Some(id) {
                continue;
            }
            let terminal = matches!(event, Event::Succeeded { .. } | Event::Failed { .. });
            events.push(event);
            if terminal {
                break;
            }
        }
    })
    .await
    .expect("job did not finish in time");
    events
}

/// Poll until `check` holds for the job, or panic after 5 seconds
pub(crate) async fn wait_for_job(
    downloader: &MediaDownloader,
    id: JobId,
    check: impl Fn(&crate::types::Job) -> bool,
) -> crate::types::Job {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let job = downloader.get_job(id).await.unwrap();
            if check(&job) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job never reached the expected state")
}
