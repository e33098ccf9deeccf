//! Generation orchestration.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use flashgen_ai::{ChatModel, ChatPrompt, SpeechToText};
use flashgen_media::{
    check_audio_size, check_duration, download_timeout, validate_youtube_url, VideoSource,
};
use flashgen_models::{ContentSource, Flashcard, GenerateRequest, SourceKind};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::PipelineLogger;
use crate::metrics::{self, Stage};
use crate::parser::parse_flashcards;
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};

/// Video the deck was generated from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub duration_secs: u64,
}

/// Output of one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDeck {
    /// Model output before parsing.
    pub raw: String,
    pub flashcards: Vec<Flashcard>,
    pub source_kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoInfo>,
    /// Length of the trimmed transcript, 0 for text input.
    pub transcript_chars: usize,
}

/// Turns text or a video URL into flashcards.
#[derive(Clone)]
pub struct FlashcardPipeline {
    video: Arc<dyn VideoSource>,
    stt: Arc<dyn SpeechToText>,
    chat: Arc<dyn ChatModel>,
    config: PipelineConfig,
}

struct Transcript {
    text: String,
    video: VideoInfo,
}

impl FlashcardPipeline {
    pub fn new(
        video: Arc<dyn VideoSource>,
        stt: Arc<dyn SpeechToText>,
        chat: Arc<dyn ChatModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            video,
            stt,
            chat,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify a wire request and generate from it.
    pub async fn generate_request(&self, request: &GenerateRequest) -> PipelineResult<GeneratedDeck> {
        let source = request.classify()?;
        self.generate(source).await
    }

    /// Run the full pipeline for one source.
    pub async fn generate(&self, source: ContentSource) -> PipelineResult<GeneratedDeck> {
        let kind = source.kind();
        let logger = PipelineLogger::new(kind);
        let span = logger.create_span();

        let result = self.run(&source, &logger).instrument(span).await;

        match &result {
            Ok(deck) => {
                metrics::record_run(kind, "success", deck.flashcards.len());
                logger.log_completion(&format!("{} flashcards", deck.flashcards.len()));
            }
            Err(e) => {
                metrics::record_run(kind, e.kind(), 0);
                if e.is_client_error() {
                    logger.log_warning(&e.to_string());
                } else {
                    logger.log_error(&e.to_string());
                }
            }
        }
        result
    }

    async fn run(
        &self,
        source: &ContentSource,
        logger: &PipelineLogger,
    ) -> PipelineResult<GeneratedDeck> {
        logger.log_start(source.kind().as_str());

        let transcript = match source {
            ContentSource::Text(_) => None,
            ContentSource::Youtube(url) => Some(self.transcribe_video(url, logger).await?),
        };

        let user_prompt = build_user_prompt(
            source,
            transcript.as_ref().map(|t| t.text.as_str()).unwrap_or_default(),
        );
        let prompt = ChatPrompt::new(SYSTEM_PROMPT, user_prompt)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        logger.log_progress("requesting flashcards from model");
        let started = Instant::now();
        let raw = self
            .chat
            .complete(&prompt)
            .await
            .map_err(PipelineError::generation)?;
        metrics::record_stage(Stage::Generation, started.elapsed().as_secs_f64());

        let flashcards = parse_flashcards(&raw);
        let (video, transcript_chars) = match transcript {
            Some(t) => (Some(t.video), t.text.chars().count()),
            None => (None, 0),
        };

        Ok(GeneratedDeck {
            raw,
            flashcards,
            source_kind: source.kind(),
            video,
            transcript_chars,
        })
    }

    async fn transcribe_video(
        &self,
        url: &str,
        logger: &PipelineLogger,
    ) -> PipelineResult<Transcript> {
        let url = validate_youtube_url(url)?;

        let metadata = self.video.metadata(&url).await?;
        check_duration(&metadata, self.config.max_video_duration_secs)?;
        logger.log_progress(&format!(
            "video {} ({}s): {}",
            metadata.id, metadata.duration_secs, metadata.title
        ));

        let timeout = download_timeout(metadata.duration_secs);
        let started = Instant::now();
        let audio = self.video.download_audio(&url, timeout).await?;
        metrics::record_stage(Stage::Download, started.elapsed().as_secs_f64());
        check_audio_size(audio.size_bytes(), self.config.min_audio_bytes)?;
        logger.log_progress(&format!("downloaded {} bytes of audio", audio.size_bytes()));

        let started = Instant::now();
        let transcript = self
            .stt
            .transcribe(audio.path())
            .await
            .map_err(PipelineError::transcription)?;
        metrics::record_stage(Stage::Transcription, started.elapsed().as_secs_f64());
        drop(audio);

        let text = transcript.trim();
        if text.is_empty() {
            return Err(PipelineError::NoSpeech);
        }
        let chars = text.chars().count();
        if chars < self.config.min_transcript_chars {
            return Err(PipelineError::LittleSpeech { chars });
        }
        logger.log_progress(&format!("transcribed {} characters", chars));

        Ok(Transcript {
            text: text.to_string(),
            video: VideoInfo {
                id: metadata.id,
                title: metadata.title,
                duration_secs: metadata.duration_secs,
            },
        })
    }
}
