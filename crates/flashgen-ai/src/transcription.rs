//! Speech-to-text client.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::error::AiResult;
use crate::http::OpenAiHttp;

/// Turns an audio file into plain text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> AiResult<String>;
}

/// OpenAI `/audio/transcriptions` client.
pub struct WhisperClient {
    http: OpenAiHttp,
}

impl WhisperClient {
    pub fn new(config: AiConfig) -> AiResult<Self> {
        let timeout = config.transcription_timeout;
        Ok(Self {
            http: OpenAiHttp::new(config, timeout)?,
        })
    }

    fn form(&self, file_name: &str, bytes: Vec<u8>) -> Form {
        let config = self.http.config();
        Form::new()
            .text("model", config.transcription_model.clone())
            .text("response_format", "text")
            .text("language", config.transcription_language.clone())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
    }

    async fn transcribe_once(&self, file_name: &str, bytes: &[u8]) -> AiResult<String> {
        let request = self
            .http
            .post("audio/transcriptions")?
            .multipart(self.form(file_name, bytes.to_vec()));
        let response = self.http.send(request).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> AiResult<String> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.webm".to_string());

        debug!(file = %file_name, bytes = bytes.len(), "Uploading audio for transcription");

        let transcript = self
            .http
            .with_retry("transcription", || self.transcribe_once(&file_name, &bytes))
            .await?;

        info!(chars = transcript.len(), "Transcription completed");
        Ok(transcript)
    }
}
