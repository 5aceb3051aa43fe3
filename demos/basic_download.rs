//! Basic download example
//!
//! This example demonstrates the core functionality of media-dl:
//! - Creating a downloader instance
//! - Subscribing to events
//! - Submitting URLs with a profile
//! - Listing the finished files
//!
//! Usage: `cargo run --example basic_download -- <url> [profile]`
//! where profile is one of 360p, 480p, 720p, 1080p, audio, playlist.

use media_dl::config::{Config, DownloadConfig};
use media_dl::{Event, JobResult, MediaDownloader, Profile};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("media_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .ok_or("usage: basic_download <url> [profile]")?;
    let profile: Profile = args.next().as_deref().unwrap_or("720p").parse()?;

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            output_dir: "downloads".into(),
            max_concurrent_jobs: Some(2),
            ..Default::default()
        },
        ..Default::default()
    };

    // Create downloader instance
    let downloader = MediaDownloader::new(config).await?;
    println!("Engine: {}", downloader.engine_name());

    // Subscribe to events
    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Queued { id, url, profile } => {
                    println!("Queued #{id} ({profile}): {url}");
                }
                Event::Started { id } => println!("Started #{id}"),
                Event::Progress { id, progress } => {
                    println!("#{id}: {}", progress.label);
                }
                Event::Succeeded { id, title, path } => {
                    println!("Done #{id}: {title} -> {}", path.display());
                }
                Event::Failed { id, kind, error } => {
                    println!("Failed #{id} ({kind}): {error}");
                }
                Event::ArtifactsRefreshed { count } => {
                    println!("{count} file(s) in output directory");
                }
                Event::Shutdown => break,
            }
        }
    });

    let id = downloader.submit(&url, profile).await?;
    downloader.wait_idle().await;

    if let Some(JobResult::Succeeded(outcome)) = downloader.get_job(id).await?.result {
        if outcome.skipped_items > 0 {
            println!("{} playlist item(s) skipped", outcome.skipped_items);
        }
    }

    println!("\nRecent files:");
    for artifact in downloader.list_recent(10).await {
        println!("  {:<60} {:>8.1} MB", artifact.name, artifact.size_mb());
    }

    downloader.shutdown().await?;
    Ok(())
}
