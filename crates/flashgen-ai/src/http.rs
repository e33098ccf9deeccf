//! Shared HTTP plumbing for OpenAI endpoints.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::warn;

use crate::config::AiConfig;
use crate::error::{AiError, AiResult};

/// Upper bound on a single retry wait.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) struct OpenAiHttp {
    client: Client,
    config: AiConfig,
}

impl OpenAiHttp {
    pub(crate) fn new(config: AiConfig, timeout: Duration) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("flashgen/0.1")
            .build()?;
        Ok(Self { client, config })
    }

    pub(crate) fn config(&self) -> &AiConfig {
        &self.config
    }

    pub(crate) fn post(&self, path: &str) -> AiResult<RequestBuilder> {
        if !self.config.is_configured() {
            return Err(AiError::MissingApiKey);
        }
        let url = format!("{}/{}", self.config.base_url, path.trim_start_matches('/'));
        Ok(self.client.post(url).bearer_auth(&self.config.api_key))
    }

    /// Send and turn non-2xx responses into [`AiError::Provider`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> AiResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AiError::Provider {
            status,
            message: provider_message(status, &body),
        })
    }

    /// Execute with retry logic.
    pub(crate) async fn with_retry<F, Fut, T>(&self, operation: &str, f: F) -> AiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = AiResult<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    warn!(
                        operation = operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "OpenAI request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// `base * 2^attempt`, saturating at [`MAX_RETRY_DELAY`].
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

/// `error.message` from the JSON body when present, else the raw body.
pub(crate) fn provider_message(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.trim().is_empty() {
            return envelope.error.message;
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("OpenAI API error (status {})", status)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 10), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, 32), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(Duration::MAX, 1), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_provider_message() {
        assert_eq!(
            provider_message(
                401,
                r#"{"error":{"message":"Incorrect API key provided: sk-***","type":"invalid_request_error"}}"#
            ),
            "Incorrect API key provided: sk-***"
        );
        assert_eq!(provider_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(provider_message(500, ""), "OpenAI API error (status 500)");
        assert_eq!(
            provider_message(400, r#"{"error":{"message":""}}"#),
            r#"{"error":{"message":""}}"#
        );
    }
}
