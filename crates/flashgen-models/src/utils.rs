//! YouTube URL parsing and validation.
//!
//! URLs are untrusted input. Only YouTube hosts are accepted and video IDs
//! must be exactly 11 characters of `[A-Za-z0-9_-]`.

use thiserror::Error;
use url::Url;

/// Hosts that serve YouTube videos.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Short-link host.
const SHORT_HOST: &str = "youtu.be";

/// Path prefixes that carry the video ID as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeIdError {
    /// URL is not a valid YouTube URL
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,
    /// Video ID has invalid format
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    /// Video ID not found in URL
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Result type for YouTube ID extraction.
pub type YoutubeIdResult<T> = Result<T, YoutubeIdError>;

/// Extract the 11-character video ID from a YouTube URL.
///
/// Supported forms:
/// - `https://www.youtube.com/watch?v=VIDEO_ID`
/// - `https://youtu.be/VIDEO_ID`
/// - `https://www.youtube.com/embed/VIDEO_ID`
/// - `https://www.youtube.com/v/VIDEO_ID`
/// - `https://www.youtube.com/shorts/VIDEO_ID`
/// - `https://www.youtube.com/live/VIDEO_ID`
///
/// A missing scheme is tolerated (`youtu.be/VIDEO_ID`).
pub fn extract_youtube_id(raw: &str) -> YoutubeIdResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    let parsed = parse_lenient(raw).ok_or(YoutubeIdError::InvalidYoutubeUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(YoutubeIdError::InvalidYoutubeUrl)?;

    let candidate = if host == SHORT_HOST {
        first_segment(&parsed)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        id_from_youtube_path(&parsed)
    } else {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    };

    match candidate {
        Some(id) => validate_youtube_id(id),
        None => Err(YoutubeIdError::VideoIdNotFound),
    }
}

/// Build the canonical watch URL for a video ID.
pub fn canonical_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

fn parse_lenient(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(u) => Some(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", raw)).ok(),
        Err(_) => None,
    }
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn id_from_youtube_path(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["watch", ..] | [] => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned()),
        [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => Some((*id).to_string()),
        _ => None,
    }
}

fn validate_youtube_id(id: String) -> YoutubeIdResult<String> {
    let valid = id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(YoutubeIdError::InvalidVideoId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id_success_cases() {
        let cases = [
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/v/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmRdnEQy4qtr",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "youtu.be/dQw4w9WgXcQ",
            "  https://YOUTUBE.COM/watch?v=dQw4w9WgXcQ  ",
        ];
        for url in cases {
            assert_eq!(extract_youtube_id(url).unwrap(), "dQw4w9WgXcQ", "url: {}", url);
        }
    }

    #[test]
    fn test_extract_youtube_id_error_cases() {
        assert_eq!(
            extract_youtube_id("https://example.com/watch?v=dQw4w9WgXcQ"),
            Err(YoutubeIdError::InvalidYoutubeUrl)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com.evil.com/watch?v=dQw4w9WgXcQ"),
            Err(YoutubeIdError::InvalidYoutubeUrl)
        );
        assert_eq!(
            extract_youtube_id("ftp://youtube.com/watch?v=dQw4w9WgXcQ"),
            Err(YoutubeIdError::InvalidYoutubeUrl)
        );
        assert_eq!(extract_youtube_id(""), Err(YoutubeIdError::InvalidYoutubeUrl));
        assert_eq!(
            extract_youtube_id("https://youtube.com"),
            Err(YoutubeIdError::VideoIdNotFound)
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/"),
            Err(YoutubeIdError::VideoIdNotFound)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/channel/UC123"),
            Err(YoutubeIdError::VideoIdNotFound)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?v=abc123"),
            Err(YoutubeIdError::InvalidVideoId)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?v=abc123def!!"),
            Err(YoutubeIdError::InvalidVideoId)
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?v="),
            Err(YoutubeIdError::InvalidVideoId)
        );
    }

    #[test]
    fn test_canonical_watch_url() {
        assert_eq!(
            canonical_watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
