//! Pipeline error taxonomy.
//!
//! Every failure the pipeline can hit is a typed variant. The user-facing
//! message and HTTP status for each variant are defined here and nowhere
//! else.

use thiserror::Error;

use flashgen_ai::AiError;
use flashgen_media::MediaError;
use flashgen_models::ContentError;

pub type PipelineResult<T> = Result<T, PipelineError>;

const VIDEO_FAILURE_PREFIX: &str = "Failed to process YouTube video: ";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ContentError),

    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("video too long: {duration_secs}s (limit {max_secs}s)")]
    VideoTooLong { duration_secs: u64, max_secs: u64 },

    #[error("download timed out after {secs}s")]
    DownloadTimeout { secs: u64 },

    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("downloaded file is empty")]
    EmptyDownload,

    #[error("downloaded audio too small: {bytes} bytes")]
    AudioTooSmall { bytes: u64 },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("no speech could be transcribed")]
    NoSpeech,

    #[error("very little speech detected ({chars} chars)")]
    LittleSpeech { chars: usize },

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("generation failed: {0}")]
    Generation(String),
}

fn describe_limit(secs: u64) -> String {
    match secs {
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}

impl PipelineError {
    /// Message shown to the caller.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidInput(e) => e.to_string(),
            PipelineError::InvalidUrl(_) => {
                "Invalid YouTube URL. Please provide a valid YouTube video link.".to_string()
            }
            PipelineError::VideoTooLong { max_secs, .. } => format!(
                "Video is too long (over {}). Please try a shorter video for better processing speed.",
                describe_limit(*max_secs)
            ),
            PipelineError::DownloadTimeout { .. } => format!(
                "{}Processing timed out. This usually happens with longer videos or slow connections. Try a shorter video (under 10 minutes).",
                VIDEO_FAILURE_PREFIX
            ),
            PipelineError::VideoUnavailable(_) | PipelineError::EmptyDownload => format!(
                "{}Video is private, unavailable, age-restricted, or region-blocked.",
                VIDEO_FAILURE_PREFIX
            ),
            PipelineError::NoSpeech | PipelineError::LittleSpeech { .. } => format!(
                "{}No clear speech detected. Try a video with clear narration or dialogue.",
                VIDEO_FAILURE_PREFIX
            ),
            PipelineError::DownloadFailed(_) => format!(
                "{}Could not download video. It may be protected or have streaming restrictions.",
                VIDEO_FAILURE_PREFIX
            ),
            PipelineError::AudioTooSmall { .. } => format!(
                "{}{}",
                VIDEO_FAILURE_PREFIX,
                MediaError::AudioTooSmall { bytes: 0 }
            ),
            PipelineError::Transcription(detail) | PipelineError::Media(detail) => {
                format!("{}{}", VIDEO_FAILURE_PREFIX, detail)
            }
            PipelineError::Generation(message) => message.clone(),
        }
    }

    /// HTTP status for this failure.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// True for failures caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_)
                | PipelineError::InvalidUrl(_)
                | PipelineError::VideoTooLong { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::InvalidUrl(_) => "invalid_url",
            PipelineError::VideoTooLong { .. } => "video_too_long",
            PipelineError::DownloadTimeout { .. } => "download_timeout",
            PipelineError::VideoUnavailable(_) => "video_unavailable",
            PipelineError::EmptyDownload => "empty_download",
            PipelineError::AudioTooSmall { .. } => "audio_too_small",
            PipelineError::DownloadFailed(_) => "download_failed",
            PipelineError::NoSpeech => "no_speech",
            PipelineError::LittleSpeech { .. } => "little_speech",
            PipelineError::Transcription(_) => "transcription",
            PipelineError::Media(_) => "media",
            PipelineError::Generation(_) => "generation",
        }
    }

    pub fn transcription(e: AiError) -> Self {
        PipelineError::Transcription(e.to_string())
    }

    pub fn generation(e: AiError) -> Self {
        PipelineError::Generation(e.to_string())
    }
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::InvalidUrl(msg) => PipelineError::InvalidUrl(msg),
            MediaError::TooLong {
                duration_secs,
                max_secs,
            } => PipelineError::VideoTooLong {
                duration_secs,
                max_secs,
            },
            MediaError::Timeout { secs } => PipelineError::DownloadTimeout { secs },
            MediaError::Unavailable(msg) => PipelineError::VideoUnavailable(msg),
            MediaError::EmptyDownload => PipelineError::EmptyDownload,
            MediaError::AudioTooSmall { bytes } => PipelineError::AudioTooSmall { bytes },
            MediaError::DownloadFailed { message } => PipelineError::DownloadFailed(message),
            other => PipelineError::Media(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(err: PipelineError) -> (u16, String) {
        (err.status_code(), err.user_message())
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            case(PipelineError::InvalidUrl("x".into())),
            (
                400,
                "Invalid YouTube URL. Please provide a valid YouTube video link.".to_string()
            )
        );
        assert_eq!(
            case(PipelineError::VideoTooLong {
                duration_secs: 4000,
                max_secs: 1800
            }),
            (
                400,
                "Video is too long (over 30 minutes). Please try a shorter video for better processing speed."
                    .to_string()
            )
        );
        assert_eq!(case(PipelineError::InvalidInput(ContentError::Empty)).0, 400);
    }

    #[test]
    fn test_too_long_message_follows_configured_limit() {
        let msg = |max_secs| {
            PipelineError::VideoTooLong {
                duration_secs: 5000,
                max_secs,
            }
            .user_message()
        };
        assert_eq!(
            msg(600),
            "Video is too long (over 10 minutes). Please try a shorter video for better processing speed."
        );
        assert!(msg(60).contains("(over 1 minute)"));
        assert!(msg(90).contains("(over 90 seconds)"));
    }

    #[test]
    fn test_video_failure_messages() {
        let (status, msg) = case(PipelineError::DownloadTimeout { secs: 60 });
        assert_eq!(status, 500);
        assert_eq!(
            msg,
            "Failed to process YouTube video: Processing timed out. This usually happens with longer videos or slow connections. Try a shorter video (under 10 minutes)."
        );

        let unavailable = "Failed to process YouTube video: Video is private, unavailable, age-restricted, or region-blocked.";
        assert_eq!(case(PipelineError::VideoUnavailable("x".into())).1, unavailable);
        assert_eq!(case(PipelineError::EmptyDownload).1, unavailable);

        let no_speech =
            "Failed to process YouTube video: No clear speech detected. Try a video with clear narration or dialogue.";
        assert_eq!(case(PipelineError::NoSpeech).1, no_speech);
        assert_eq!(case(PipelineError::LittleSpeech { chars: 12 }).1, no_speech);

        assert_eq!(
            case(PipelineError::DownloadFailed("HTTP 403".into())).1,
            "Failed to process YouTube video: Could not download video. It may be protected or have streaming restrictions."
        );
        assert_eq!(
            case(PipelineError::AudioTooSmall { bytes: 10 }).1,
            "Failed to process YouTube video: Downloaded file is too small - video may have no audio or be very short"
        );
        assert_eq!(
            case(PipelineError::Transcription("Invalid file format.".into())).1,
            "Failed to process YouTube video: Invalid file format."
        );
    }

    #[test]
    fn test_generation_message_is_verbatim() {
        let err = PipelineError::generation(AiError::Provider {
            status: 429,
            message: "Rate limit reached for gpt-3.5-turbo".to_string(),
        });
        assert_eq!(case(err), (500, "Rate limit reached for gpt-3.5-turbo".to_string()));
    }

    #[test]
    fn test_media_error_mapping() {
        assert!(matches!(
            PipelineError::from(MediaError::Timeout { secs: 75 }),
            PipelineError::DownloadTimeout { secs: 75 }
        ));
        assert!(matches!(
            PipelineError::from(MediaError::TooLong {
                duration_secs: 2000,
                max_secs: 1800
            }),
            PipelineError::VideoTooLong { .. }
        ));
        assert!(matches!(
            PipelineError::from(MediaError::download_failed("x")),
            PipelineError::DownloadFailed(_)
        ));
        let err = PipelineError::from(MediaError::YtDlpNotFound);
        assert_eq!(
            err.user_message(),
            "Failed to process YouTube video: yt-dlp not found in PATH"
        );
        assert_eq!(err.kind(), "media");
    }
}
