//! Flashcard generation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use flashgen_models::{Flashcard, GenerateRequest, SourceKind};
use flashgen_pipeline::VideoInfo;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Raw model output, one `question|answer` per line when the model complied
    pub result: String,
    pub flashcards: Vec<Flashcard>,
    pub source_type: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoInfo>,
    pub transcript_chars: usize,
}

/// Generate flashcards from text or a YouTube URL.
pub async fn generate_flashcards(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload?;
    let deck = state.pipeline.generate_request(&request).await?;

    Ok(Json(GenerateResponse {
        result: deck.raw,
        flashcards: deck.flashcards,
        source_type: deck.source_kind,
        video: deck.video,
        transcript_chars: deck.transcript_chars,
    }))
}
