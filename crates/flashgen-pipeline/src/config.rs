//! Pipeline configuration.

use std::path::PathBuf;

use flashgen_media::{MAX_VIDEO_DURATION_SECS, MIN_AUDIO_BYTES};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest accepted video
    pub max_video_duration_secs: u64,
    /// Smallest accepted audio download
    pub min_audio_bytes: u64,
    /// Shortest accepted transcript (trimmed)
    pub min_transcript_chars: usize,
    /// Completion token budget
    pub max_tokens: u32,
    pub temperature: f64,
    /// Work directory for temporary audio files
    pub work_dir: PathBuf,
    /// Optional Netscape cookies file for yt-dlp
    pub cookies_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_video_duration_secs: MAX_VIDEO_DURATION_SECS,
            min_audio_bytes: MIN_AUDIO_BYTES,
            min_transcript_chars: 50,
            max_tokens: 800,
            temperature: 0.7,
            work_dir: std::env::temp_dir().join("flashgen"),
            cookies_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_video_duration_secs: std::env::var("MAX_VIDEO_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_video_duration_secs),
            min_audio_bytes: std::env::var("MIN_AUDIO_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_audio_bytes),
            min_transcript_chars: std::env::var("MIN_TRANSCRIPT_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_transcript_chars),
            max_tokens: std::env::var("MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: std::env::var("TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|t: &f64| (0.0..=2.0).contains(t))
                .unwrap_or(defaults.temperature),
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            cookies_path: std::env::var("YTDLP_COOKIES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
