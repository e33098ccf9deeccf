//! yt-dlp wrapper for video acquisition.
//!
//! This crate provides:
//! - YouTube URL validation
//! - Video metadata lookup (`yt-dlp --dump-single-json`)
//! - Audio-only download under a timeout, into a self-cleaning temp dir
//! - The [`VideoSource`] seam used by the generation pipeline

pub mod cookies;
pub mod download;
pub mod error;
pub mod source;

pub use download::{
    check_audio_size, check_duration, classify_ytdlp_failure, download_audio, download_timeout,
    fetch_metadata, validate_youtube_url, DownloadedAudio, VideoMetadata, MAX_VIDEO_DURATION_SECS,
    MIN_AUDIO_BYTES,
};
pub use error::{MediaError, MediaResult};
pub use source::{VideoSource, YtDlpSource};
