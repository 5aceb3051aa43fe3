//! Reveal a directory in the platform file manager

use std::path::Path;
use tokio::process::Command;

#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const OPENER: &str = "xdg-open";

/// Open `dir` in the OS file manager
///
/// Fire-and-forget: the launcher is started but not waited on. Returns `false`
/// if `dir` is not an existing directory or the launcher could not be started.
pub async fn reveal_dir(dir: &Path) -> bool {
    if !tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        tracing::warn!(path = %dir.display(), "Cannot reveal missing directory");
        return false;
    }

    match Command::new(OPENER).arg(dir).spawn() {
        Ok(_child) => {
            tracing::debug!(path = %dir.display(), opener = OPENER, "Revealed directory");
            true
        }
        Err(e) => {
            tracing::warn!(path = %dir.display(), opener = OPENER, error = %e, "Could not open folder");
            false
        }
    }
}
