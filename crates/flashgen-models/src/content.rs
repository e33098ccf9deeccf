//! Generation request and content source classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted length (in characters) for raw text input.
pub const MAX_TEXT_LENGTH: usize = 50_000;

/// Wire request for flashcard generation.
///
/// `type` is `"youtube"` for video URLs; anything else is treated as raw text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

/// Classified generation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Raw text pasted by the user.
    Text(String),
    /// A video URL (not yet validated).
    Youtube(String),
}

/// Source kind label for logs, metrics and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Youtube,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Text => "text",
            SourceKind::Youtube => "youtube",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while classifying a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Please provide some text or a YouTube URL.")]
    Empty,

    #[error("Text is too long ({0} characters). Please keep it under {max} characters.", max = MAX_TEXT_LENGTH)]
    TooLong(usize),
}

impl GenerateRequest {
    /// Dispatch on the request type.
    pub fn classify(&self) -> Result<ContentSource, ContentError> {
        let value = self.value.trim();
        if value.is_empty() {
            return Err(ContentError::Empty);
        }

        if self.kind.trim().eq_ignore_ascii_case("youtube") {
            return Ok(ContentSource::Youtube(value.to_string()));
        }

        let len = value.chars().count();
        if len > MAX_TEXT_LENGTH {
            return Err(ContentError::TooLong(len));
        }
        Ok(ContentSource::Text(value.to_string()))
    }
}

impl ContentSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ContentSource::Text(_) => SourceKind::Text,
            ContentSource::Youtube(_) => SourceKind::Youtube,
        }
    }
}
