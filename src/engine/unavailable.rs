//! Engine stand-in used when yt-dlp is unavailable

use async_trait::async_trait;

use super::traits::{EngineError, EngineOutput, FetchEngine, ProgressCallback};
use crate::profile::EngineConfig;

/// Engine used when no yt-dlp binary is available or configured
///
/// Every fetch fails with [`EngineError::NotAvailable`], so submissions still
/// produce a job that ends `Failed` with an actionable message.
pub struct UnavailableEngine;

#[async_trait]
impl FetchEngine for UnavailableEngine {
    async fn fetch(
        &self,
        _url: &str,
        _config: &EngineConfig,
        _on_progress: ProgressCallback<'_>,
    ) -> Result<EngineOutput, EngineError> {
        Err(EngineError::NotAvailable(
            "downloading requires the yt-dlp binary. \
             Configure ytdlp_path in config or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
