//! # media-dl
//!
//! Backend library for queued media downloads driven by yt-dlp.
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Non-blocking** - `submit` returns immediately; each job runs on its own task
//! - **Sensible defaults** - Works out of the box with yt-dlp on PATH
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, Event, MediaDownloader, Profile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Progress { id, progress } = event {
//!                 println!("{id}: {}", progress.label);
//!             }
//!         }
//!     });
//!
//!     let id = downloader
//!         .submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Profile::AudioOnly)
//!         .await?;
//!     downloader.wait_idle().await;
//!     println!("{:?}", downloader.get_job(id).await?.state);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod artifacts;
pub mod config;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod profile;
pub mod progress;
pub mod shell;
pub mod types;

// Re-export commonly used types
pub use artifacts::{Artifact, ArtifactKind, ArtifactRegistry};
pub use config::{Config, DownloadConfig, ToolsConfig};
pub use downloader::{MediaDownloader, classify_failure};
pub use engine::{EngineError, EngineOutput, FetchEngine, UnavailableEngine, YtDlpEngine};
pub use error::{Error, JobError, Result};
pub use profile::{EngineConfig, Profile, resolve};
pub use progress::{ProgressEvent, RawProgress, translate};
pub use types::{Event, FailureKind, Job, JobFailure, JobId, JobOutcome, JobResult, JobState};
