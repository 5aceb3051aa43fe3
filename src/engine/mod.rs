//! Fetch engine boundary
//!
//! The engine performs the actual network retrieval and transcoding. This
//! module defines the [`FetchEngine`] trait the downloader talks to, and two
//! implementations:
//!
//! - [`YtDlpEngine`]: drives the external `yt-dlp` binary
//! - [`UnavailableEngine`]: stand-in when no binary can be found, so every job
//!   fails with a clear message instead of the downloader refusing to start
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::engine::{FetchEngine, YtDlpEngine};
//! use media_dl::profile::{resolve, Profile};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = YtDlpEngine::from_path().expect("yt-dlp not found");
//!     let config = resolve(Profile::P720, Path::new("downloads"));
//!
//!     let output = engine
//!         .fetch("https://example.com/watch?v=abc", &config, &|raw| {
//!             println!("{raw:?}");
//!         })
//!         .await?;
//!     println!("saved {:?}", output.files);
//!     Ok(())
//! }
//! ```

mod parser;
mod traits;
mod unavailable;
mod ytdlp;

pub use parser::{EngineLine, PrintedArtifact, parse_line};
pub use traits::{EngineError, EngineOutput, FetchEngine, ProgressCallback};
pub use unavailable::UnavailableEngine;
pub use ytdlp::YtDlpEngine;
