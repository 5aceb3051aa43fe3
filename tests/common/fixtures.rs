//! Fake engines: a yt-dlp stand-in shell script and an in-process engine

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use media_dl::engine::{EngineError, EngineOutput, FetchEngine, ProgressCallback};
use media_dl::{EngineConfig, RawProgress};

/// Shell script that speaks yt-dlp's line protocol as configured by media-dl
///
/// Behaviour is picked from the URL:
/// - contains `unsupported`: fails like yt-dlp on an unknown site
/// - contains `offline`: fails with a DNS error
/// - contains `private-list` with `--yes-playlist`: every entry is private,
///   the playlist still completes and the script exits 1
/// - with `--yes-playlist`: writes two entries into `Fake Mix/`, reports one
///   private entry, marks the playlist done and exits 1 (as yt-dlp does with
///   `--ignore-errors`)
/// - otherwise: reports progress and writes `Fake Clip.<ext>`
pub const FAKE_YTDLP: &str = r#"#!/bin/sh
tmpl=""
prev=""
playlist=0
audio=0
url=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then tmpl="$arg"; fi
  case "$arg" in
    --yes-playlist) playlist=1 ;;
    -x) audio=1 ;;
  esac
  prev="$arg"
  url="$arg"
done

ext=mp4
if [ "$audio" = 1 ]; then ext=mp3; fi

case "$url" in
  *unsupported*)
    echo "ERROR: [generic] Unsupported URL: $url" >&2
    exit 1
    ;;
  *offline*)
    echo "ERROR: Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>" >&2
    exit 1
    ;;
  *private-list*)
    if [ "$playlist" = 1 ]; then
      echo "[youtube:tab] Downloading playlist Private Mix - 1 items"
      echo "ERROR: [youtube] abc: Private video. Sign in if you've been granted access" >&2
      echo 'PLAYLIST_DONE:"Private Mix"'
      echo "[download] Finished downloading playlist: Private Mix"
      exit 1
    fi
    ;;
esac

echo "[generic] Extracting URL: $url"
echo 'PROGRESS:{"status":"downloading","downloaded_bytes":256,"total_bytes":1024,"speed":512.0}'
echo 'PROGRESS:{"status":"downloading","downloaded_bytes":1024,"total_bytes":1024,"speed":1024.0}'
echo 'PROGRESS:{"status":"finished","filename":"ignored"}'

if [ "$playlist" = 1 ]; then
  dir="$(dirname "$(dirname "$tmpl")")/Fake Mix"
  mkdir -p "$dir"
  : > "$dir/Track One.$ext"
  printf 'ARTIFACT:{"title":"Track One","filepath":"%s","playlist_title":"Fake Mix"}\n' "$dir/Track One.$ext"
  echo "ERROR: [youtube] abc: Private video. Sign in if you've been granted access" >&2
  : > "$dir/Track Three.$ext"
  printf 'ARTIFACT:{"title":"Track Three","filepath":"%s","playlist_title":"Fake Mix"}\n' "$dir/Track Three.$ext"
  echo 'PLAYLIST_DONE:"Fake Mix"'
  exit 1
fi

dir="$(dirname "$tmpl")"
: > "$dir/Fake Clip.$ext"
printf 'ARTIFACT:{"title":"Fake Clip","filepath":"%s","playlist_title":null}\n' "$dir/Fake Clip.$ext"
exit 0
"#;

/// Write [`FAKE_YTDLP`] into `dir` and make it executable
#[cfg(unix)]
pub fn install_fake_ytdlp(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("yt-dlp");
    std::fs::write(&path, FAKE_YTDLP).expect("failed to write fake yt-dlp");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod fake yt-dlp");
    path
}

/// In-process engine: sleeps, reports a full transfer, writes one file
pub struct SleepyEngine {
    pub delay: Duration,
}

#[async_trait]
impl FetchEngine for SleepyEngine {
    async fn fetch(
        &self,
        url: &str,
        config: &EngineConfig,
        on_progress: ProgressCallback<'_>,
    ) -> Result<EngineOutput, EngineError> {
        tokio::time::sleep(self.delay).await;
        on_progress(RawProgress::Downloading {
            downloaded_bytes: Some(10.0),
            total_bytes: Some(10.0),
            total_bytes_estimate: None,
            speed: Some(10.0),
            filename: None,
        });

        let title = url.rsplit('/').next().unwrap_or("clip").to_string();
        let path = config.output.render(Some(&title), None, "mp4");
        tokio::fs::write(&path, b"media").await?;
        Ok(EngineOutput {
            title: Some(title),
            playlist_title: None,
            files: vec![path],
            item_errors: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "sleepy"
    }
}
