//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while acquiring video audio.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Video is unavailable: {0}")]
    Unavailable(String),

    #[error("Video is too long ({duration_secs}s, limit {max_secs}s)")]
    TooLong { duration_secs: u64, max_secs: u64 },

    #[error("Download timeout after {secs} seconds. Video may be too long or have connection issues.")]
    Timeout { secs: u64 },

    #[error("Downloaded file is empty - video may be private, age-restricted, or unavailable")]
    EmptyDownload,

    #[error("Downloaded file is too small - video may have no audio or be very short")]
    AudioTooSmall { bytes: u64 },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an unavailable-video error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
