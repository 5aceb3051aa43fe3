//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`jobs`] - Job submission and snapshot queries
//! - [`updater`] - Single-writer task applying worker updates to the job table
//! - [`worker`] - Per-job execution against the fetch engine
//! - [`registry`] - Artifact listing and post-completion refresh
//! - [`lifecycle`] - Graceful shutdown

mod jobs;
mod lifecycle;
mod registry;
mod updater;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use worker::classify_failure;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};

use crate::artifacts::ArtifactRegistry;
use crate::config::Config;
use crate::engine::{FetchEngine, UnavailableEngine, YtDlpEngine};
use crate::error::{Error, Result};
use crate::types::Event;

use registry::ArtifactRefresher;
use updater::{JobTable, JobUpdate};

/// Capacity of the event broadcast buffer
const EVENT_BUFFER: usize = 1000;

/// Job table and the bookkeeping around it
#[derive(Clone)]
pub(crate) struct QueueState {
    /// All jobs ever submitted, in submission order (inserted by `submit`, updated by the updater task)
    pub(crate) table: Arc<tokio::sync::RwLock<JobTable>>,
    /// Next id to hand out; ids are never reused
    pub(crate) next_id: Arc<AtomicU64>,
    /// Channel from workers to the updater task
    pub(crate) update_tx: tokio::sync::mpsc::UnboundedSender<JobUpdate>,
    /// Optional cap on concurrently running jobs
    pub(crate) concurrent_limit: Option<Arc<tokio::sync::Semaphore>>,
    /// Tracks in-flight worker tasks for shutdown
    pub(crate) workers: tokio_util::task::TaskTracker,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Serializes closing and reopening `workers` between `wait_idle` and `shutdown`
    pub(crate) tracker_gate: Arc<tokio::sync::Mutex<()>>,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Accepts job submissions, runs one worker task per job, and publishes job
/// state through snapshots ([`get_job`](Self::get_job),
/// [`list_jobs`](Self::list_jobs)) and an event stream
/// ([`subscribe`](Self::subscribe)).
#[derive(Clone)]
pub struct MediaDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Engine that performs the actual fetch/transcode
    pub(crate) engine: Arc<dyn FetchEngine>,
    /// Output directory scanner and its cached snapshot
    pub(crate) artifacts: ArtifactRefresher,
    /// Job table and worker bookkeeping
    pub(crate) queue_state: QueueState,
}

impl MediaDownloader {
    /// Create a new MediaDownloader using yt-dlp as the engine
    ///
    /// The engine is chosen from configuration:
    /// - `ytdlp_path` if set
    /// - otherwise yt-dlp from PATH, if `search_path` is enabled
    /// - otherwise an engine that fails every job with an explanatory message
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the output
    /// directory cannot be created.
    pub async fn new(config: Config) -> Result<Self> {
        let engine: Arc<dyn FetchEngine> = if let Some(ref path) = config.tools.ytdlp_path {
            Arc::new(Self::configure_ytdlp(YtDlpEngine::new(path.clone()), &config))
        } else if config.tools.search_path {
            YtDlpEngine::from_path()
                .map(|e| Arc::new(Self::configure_ytdlp(e, &config)) as Arc<dyn FetchEngine>)
                .unwrap_or_else(|| Arc::new(UnavailableEngine))
        } else {
            Arc::new(UnavailableEngine)
        };

        Self::with_engine(config, engine).await
    }

    /// Create a new MediaDownloader with a caller-supplied engine
    ///
    /// Must be called from within a tokio runtime: the job table's updater
    /// task is spawned here.
    pub async fn with_engine(config: Config, engine: Arc<dyn FetchEngine>) -> Result<Self> {
        config.validate()?;

        // Ensure the output directory exists
        tokio::fs::create_dir_all(&config.download.output_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory '{}': {}",
                        config.download.output_dir.display(),
                        e
                    ),
                ))
            })?;

        tracing::info!(
            engine = engine.name(),
            output_dir = %config.download.output_dir.display(),
            max_concurrent_jobs = ?config.download.max_concurrent_jobs,
            "Media downloader initialized"
        );

        // Create broadcast channel; each subscriber receives every event independently
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_BUFFER);

        let artifacts = ArtifactRefresher::new(
            ArtifactRegistry::new(config.download.output_dir.clone()),
            config.download.recent_limit,
            event_tx.clone(),
        );
        let table = Arc::new(tokio::sync::RwLock::new(JobTable::default()));
        let (update_tx, update_rx) = tokio::sync::mpsc::unbounded_channel();

        let concurrent_limit = config
            .download
            .max_concurrent_jobs
            .map(|n| Arc::new(tokio::sync::Semaphore::new(n)));

        let queue_state = QueueState {
            table,
            next_id: Arc::new(AtomicU64::new(1)),
            update_tx,
            concurrent_limit,
            workers: tokio_util::task::TaskTracker::new(),
            accepting_new: Arc::new(AtomicBool::new(true)),
            tracker_gate: Arc::new(tokio::sync::Mutex::new(())),
        };

        let downloader = Self {
            event_tx,
            config: Arc::new(config),
            engine,
            artifacts,
            queue_state,
        };

        downloader.spawn_updater(update_rx);
        // Initial snapshot, taken before any caller can subscribe
        downloader.artifacts.refresh().await;

        Ok(downloader)
    }

    fn configure_ytdlp(engine: YtDlpEngine, config: &Config) -> YtDlpEngine {
        engine
            .with_ffmpeg(config.tools.ffmpeg_path.clone())
            .with_extra_args(config.tools.extra_args.clone())
    }

    /// Subscribe to job events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. A subscriber that falls more than 1000 events behind
    /// receives `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{MediaDownloader, Config, Profile};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("{:?}", event);
    ///         }
    ///     });
    ///
    ///     downloader.submit("https://example.com/watch?v=abc", Profile::P720).await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Job events as a `Stream`
    ///
    /// Lagged notifications are surfaced as `Err` items rather than ending the
    /// stream.
    pub fn event_stream(&self) -> tokio_stream::wrappers::BroadcastStream<Event> {
        tokio_stream::wrappers::BroadcastStream::new(self.event_tx.subscribe())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the engine jobs run on
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
