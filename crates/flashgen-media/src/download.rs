//! Video metadata and audio download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use flashgen_models::{canonical_watch_url, extract_youtube_id};

use crate::cookies::prepare_cookies;
use crate::error::{MediaError, MediaResult};

/// Longest video accepted (30 minutes).
pub const MAX_VIDEO_DURATION_SECS: u64 = 1800;

/// Smallest audio file that can plausibly contain speech.
pub const MIN_AUDIO_BYTES: u64 = 1000;

/// Floor for the download timeout.
const MIN_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Extra download time granted per minute of video.
const TIMEOUT_SECS_PER_MINUTE: u64 = 15;

/// Metadata lookups never need long.
const METADATA_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Output file stem inside the download dir. yt-dlp picks the extension.
const AUDIO_STEM: &str = "audio";

/// Video metadata from `yt-dlp --dump-single-json`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    /// Duration in whole seconds, 0 when unknown.
    pub duration_secs: u64,
    pub availability: Option<String>,
    pub is_live: bool,
}

#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    availability: Option<String>,
    #[serde(default)]
    is_live: Option<bool>,
}

impl VideoMetadata {
    /// Parse yt-dlp's JSON dump.
    pub fn from_ytdlp_json(json: &str) -> MediaResult<Self> {
        let raw: RawVideoInfo = serde_json::from_str(json.trim())?;
        Ok(Self {
            title: raw.title.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            duration_secs: raw.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
            availability: raw.availability,
            is_live: raw.is_live.unwrap_or(false),
        })
    }
}

/// Audio downloaded into a private temp dir.
///
/// The directory and everything in it is removed when this value drops.
#[derive(Debug)]
pub struct DownloadedAudio {
    path: PathBuf,
    size_bytes: u64,
    _dir: TempDir,
}

impl DownloadedAudio {
    /// Wrap an existing file inside an owned temp dir.
    pub fn new(dir: TempDir, path: PathBuf, size_bytes: u64) -> Self {
        Self {
            path,
            size_bytes,
            _dir: dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Validate a YouTube URL and return the canonical watch URL.
pub fn validate_youtube_url(url: &str) -> MediaResult<String> {
    extract_youtube_id(url)
        .map(|id| canonical_watch_url(&id))
        .map_err(|e| MediaError::InvalidUrl(e.to_string()))
}

/// Download timeout for a video: at least 60s, plus 15s per minute of video.
pub fn download_timeout(duration_secs: u64) -> Duration {
    let minutes = (duration_secs as f64 / 60.0).round() as u64;
    Duration::from_secs(MIN_DOWNLOAD_TIMEOUT_SECS.max(minutes * TIMEOUT_SECS_PER_MINUTE))
}

/// Reject videos that cannot be processed before anything is downloaded.
pub fn check_duration(metadata: &VideoMetadata, max_secs: u64) -> MediaResult<()> {
    if metadata.is_live {
        return Err(MediaError::unavailable("live streams are not supported"));
    }

    if let Some(availability) = metadata.availability.as_deref() {
        if matches!(
            availability,
            "private" | "premium_only" | "subscriber_only" | "needs_auth"
        ) {
            return Err(MediaError::unavailable(format!(
                "video availability is {}",
                availability
            )));
        }
    }

    if metadata.duration_secs > max_secs {
        return Err(MediaError::TooLong {
            duration_secs: metadata.duration_secs,
            max_secs,
        });
    }
    Ok(())
}

/// Reject empty or implausibly small downloads.
pub fn check_audio_size(size_bytes: u64, min_bytes: u64) -> MediaResult<()> {
    if size_bytes == 0 {
        return Err(MediaError::EmptyDownload);
    }
    if size_bytes < min_bytes {
        return Err(MediaError::AudioTooSmall { bytes: size_bytes });
    }
    Ok(())
}

/// Map yt-dlp stderr to a typed error.
pub fn classify_ytdlp_failure(stderr: &str) -> MediaError {
    let lower = stderr.to_lowercase();
    let unavailable = [
        "private",
        "unavailable",
        "age-restricted",
        "age restricted",
        "confirm your age",
        "sign in",
        "country",
    ]
    .iter()
    .any(|pattern| lower.contains(pattern));

    let message = error_line(stderr);
    if unavailable {
        MediaError::unavailable(message)
    } else {
        MediaError::download_failed(format!("yt-dlp failed: {}", message))
    }
}

/// Last `ERROR:` line, else the last non-empty line.
fn error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Fetch video metadata without downloading.
pub async fn fetch_metadata(
    binary: &Path,
    url: &str,
    cookies: Option<&Path>,
) -> MediaResult<VideoMetadata> {
    let mut cmd = Command::new(binary);
    cmd.args([
        "--dump-single-json",
        "--no-download",
        "--no-playlist",
        "--no-warnings",
    ]);
    if let Some(cp) = cookies {
        cmd.arg("--cookies").arg(cp);
    }
    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(url = %url, "Fetching video metadata");

    let output = tokio::time::timeout(METADATA_TIMEOUT, cmd.output())
        .await
        .map_err(|_| MediaError::Timeout {
            secs: METADATA_TIMEOUT.as_secs(),
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        return Err(classify_ytdlp_failure(&stderr));
    }

    let metadata = VideoMetadata::from_ytdlp_json(&String::from_utf8_lossy(&output.stdout))?;
    info!(
        video_id = %metadata.id,
        duration_secs = metadata.duration_secs,
        "Fetched video metadata"
    );
    Ok(metadata)
}

/// Download the lowest-quality audio stream into a fresh temp dir under
/// `work_dir`.
///
/// The yt-dlp child is killed if `timeout` expires.
pub async fn download_audio(
    binary: &Path,
    url: &str,
    work_dir: &Path,
    timeout: Duration,
    cookies_source: Option<&Path>,
) -> MediaResult<DownloadedAudio> {
    tokio::fs::create_dir_all(work_dir).await?;
    let dir = tempfile::Builder::new()
        .prefix("flashgen-audio-")
        .tempdir_in(work_dir)?;

    let cookies = match cookies_source {
        Some(source) => prepare_cookies(source, dir.path()).await,
        None => None,
    };

    let template = dir.path().join(format!("{}.%(ext)s", AUDIO_STEM));

    let mut cmd = Command::new(binary);
    cmd.args([
        "--no-playlist",
        "--no-progress",
        "--no-part",
        "--user-agent",
        USER_AGENT,
        "-f",
        "worstaudio/bestaudio",
        "-o",
    ])
    .arg(&template);
    if let Some(cp) = &cookies {
        cmd.arg("--cookies").arg(cp);
    }
    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!(
        url = %url,
        timeout_secs = timeout.as_secs(),
        "Downloading audio"
    );

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(url = %url, timeout_secs = timeout.as_secs(), "Audio download timed out");
            return Err(MediaError::Timeout {
                secs: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        return Err(classify_ytdlp_failure(&stderr));
    }

    let path = find_audio_file(dir.path())
        .await?
        .ok_or_else(|| MediaError::download_failed("Output file not created"))?;
    let size_bytes = tokio::fs::metadata(&path).await?.len();

    info!(
        output = %path.display(),
        size_bytes = size_bytes,
        "Downloaded audio"
    );

    Ok(DownloadedAudio::new(dir, path, size_bytes))
}

async fn find_audio_file(dir: &Path) -> MediaResult<Option<PathBuf>> {
    let prefix = format!("{}.", AUDIO_STEM);
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && !name.ends_with(".part") {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
