//! Chat completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::error::{AiError, AiResult};
use crate::http::OpenAiHttp;

/// Returned when the model produces no content.
pub const EMPTY_COMPLETION: &str = "No response from AI.";

/// A single-turn prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 800,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A language model that completes a system + user prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> AiResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI `/chat/completions` client.
pub struct OpenAiChatClient {
    http: OpenAiHttp,
}

impl OpenAiChatClient {
    pub fn new(config: AiConfig) -> AiResult<Self> {
        let timeout = config.timeout;
        Ok(Self {
            http: OpenAiHttp::new(config, timeout)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.http.config().chat_model
    }

    async fn complete_once(&self, prompt: &ChatPrompt) -> AiResult<String> {
        let body = ChatRequest {
            model: &self.http.config().chat_model,
            messages: [
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };

        let request = self.http.post("chat/completions")?.json(&body);
        let response = self.http.send(request).await?;
        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AiError::InvalidResponse(format!("chat completion: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty());

        Ok(content.unwrap_or_else(|| EMPTY_COMPLETION.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, prompt: &ChatPrompt) -> AiResult<String> {
        debug!(
            model = %self.model(),
            prompt_chars = prompt.user.len(),
            "Requesting chat completion"
        );
        let content = self
            .http
            .with_retry("chat_completion", || self.complete_once(prompt))
            .await?;
        info!(
            model = %self.model(),
            response_chars = content.len(),
            "Chat completion succeeded"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiChatClient {
        let mut config = AiConfig::default()
            .with_base_url(format!("{}/v1", server.uri()))
            .with_api_key("sk-test");
        config.retry_base_delay = Duration::from_millis(5);
        OpenAiChatClient::new(config).unwrap()
    }

    fn completion(content: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[tokio::test]
    async fn test_complete_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 800,
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" }
                ]
            })))
            .respond_with(completion(serde_json::json!("What is ATP?|Energy")))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, "What is ATP?|Energy");
    }

    #[tokio::test]
    async fn test_empty_content_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(serde_json::Value::Null))
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn test_whitespace_content_is_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(serde_json::json!(" \n ")))
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, " \n ");
    }

    #[tokio::test]
    async fn test_empty_string_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(serde_json::json!("")))
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn test_no_choices_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect API key provided");
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_retries_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion(serde_json::json!("Q|A")))
            .with_priority(2)
            .mount(&server)
            .await;

        let out = client(&server)
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(out, "Q|A");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let config = AiConfig::default().with_base_url("http://127.0.0.1:1");
        let err = OpenAiChatClient::new(config)
            .unwrap()
            .complete(&ChatPrompt::new("sys", "usr"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }
}
