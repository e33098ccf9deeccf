//! OpenAI client configuration.

use std::time::Duration;

/// Configuration shared by the transcription and chat clients.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key, empty when not configured
    pub api_key: String,
    /// Base URL including the version prefix
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// Transcription language hint
    pub transcription_language: String,
    /// Chat request timeout
    pub timeout: Duration,
    /// Transcription request timeout (uploads can be large)
    pub transcription_timeout: Duration,
    pub max_retries: u32,
    /// First retry delay, doubled on each attempt
    pub retry_base_delay: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            transcription_model: "whisper-1".to_string(),
            transcription_language: "en".to_string(),
            timeout: Duration::from_secs(120),
            transcription_timeout: Duration::from_secs(300),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl AiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            chat_model: std::env::var("OPENAI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            transcription_model: std::env::var("OPENAI_TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            transcription_language: std::env::var("OPENAI_TRANSCRIPTION_LANGUAGE")
                .unwrap_or(defaults.transcription_language),
            timeout: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            transcription_timeout: std::env::var("OPENAI_TRANSCRIPTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.transcription_timeout),
            max_retries: std::env::var("OPENAI_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: std::env::var("OPENAI_RETRY_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
        }
    }

    /// Point the clients at another server (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.transcription_language, "en");
        assert!(!config.is_configured());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("OPENAI_BASE_URL", "http://localhost:9999/v1/");
        std::env::set_var("OPENAI_MAX_RETRIES", "5");
        std::env::set_var("OPENAI_TIMEOUT_SECS", "not-a-number");

        let config = AiConfig::from_env();
        assert!(config.is_configured());
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout, Duration::from_secs(120));

        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("OPENAI_BASE_URL");
        std::env::remove_var("OPENAI_MAX_RETRIES");
        std::env::remove_var("OPENAI_TIMEOUT_SECS");
    }
}
