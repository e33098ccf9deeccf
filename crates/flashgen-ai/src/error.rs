//! AI client error types.

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY not configured")]
    MissingApiKey,

    /// Non-2xx response. `message` is the provider's own error text.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Provider { status, .. } => *status == 429 || *status >= 500,
            AiError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}
