//! Video source abstraction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::download::{self, DownloadedAudio, VideoMetadata};
use crate::error::{MediaError, MediaResult};

/// Where video metadata and audio come from.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Look up metadata without downloading.
    async fn metadata(&self, url: &str) -> MediaResult<VideoMetadata>;

    /// Download the audio track, failing with [`MediaError::Timeout`] after
    /// `timeout`.
    async fn download_audio(&self, url: &str, timeout: Duration) -> MediaResult<DownloadedAudio>;
}

/// yt-dlp backed [`VideoSource`].
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary: Option<PathBuf>,
    work_dir: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl YtDlpSource {
    /// Create a source that downloads under `work_dir`, finding yt-dlp on PATH.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: None,
            work_dir: work_dir.into(),
            cookies_path: None,
        }
    }

    /// Use a specific yt-dlp executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Pass a Netscape cookies file to yt-dlp when it is valid.
    pub fn with_cookies(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Whether yt-dlp can be found.
    pub fn is_available(&self) -> bool {
        self.resolve_binary().is_ok()
    }

    fn resolve_binary(&self) -> MediaResult<PathBuf> {
        match &self.binary {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(_) => Err(MediaError::YtDlpNotFound),
            None => which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound),
        }
    }

    fn metadata_cookies(&self) -> Option<&Path> {
        self.cookies_path.as_deref().filter(|p| p.exists())
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn metadata(&self, url: &str) -> MediaResult<VideoMetadata> {
        let binary = self.resolve_binary()?;
        download::fetch_metadata(&binary, url, self.metadata_cookies()).await
    }

    async fn download_audio(&self, url: &str, timeout: Duration) -> MediaResult<DownloadedAudio> {
        let binary = self.resolve_binary()?;
        download::download_audio(
            &binary,
            url,
            &self.work_dir,
            timeout,
            self.cookies_path.as_deref(),
        )
        .await
    }
}
