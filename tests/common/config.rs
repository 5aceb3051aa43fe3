//! Test configuration helpers for creating downloaders over temp directories

use std::path::Path;
use std::sync::Arc;

use media_dl::{Config, FetchEngine, MediaDownloader};
use tempfile::TempDir;

/// Config writing into `<temp>/downloads`, never searching PATH for yt-dlp
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.output_dir = temp_dir.path().join("downloads");
    config.tools.search_path = false;
    config
}

/// Downloader driven by the yt-dlp executable at `ytdlp`
pub async fn create_ytdlp_downloader(temp_dir: &TempDir, ytdlp: &Path) -> MediaDownloader {
    let mut config = test_config(temp_dir);
    config.tools.ytdlp_path = Some(ytdlp.to_path_buf());
    MediaDownloader::new(config)
        .await
        .expect("failed to create downloader")
}

/// Downloader driven by an in-process engine
pub async fn create_engine_downloader(
    temp_dir: &TempDir,
    engine: Arc<dyn FetchEngine>,
) -> MediaDownloader {
    MediaDownloader::with_engine(test_config(temp_dir), engine)
        .await
        .expect("failed to create downloader")
}

/// Live test URL from `MEDIA_DL_LIVE_URL`, if set
pub fn live_url() -> Option<String> {
    std::env::var("MEDIA_DL_LIVE_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
}
