//! Flashcard set storage and export handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use flashgen_models::{to_anki_text, Flashcard, FlashcardSet};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

const EXPORT_FILENAME: &str = "flashcards.txt";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveFlashcardsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one flashcard is required"))]
    pub flashcards: Vec<Flashcard>,
    /// Must match the token subject when present
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFlashcardsResponse {
    pub success: bool,
    pub set_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FlashcardSetsResponse {
    pub sets: Vec<FlashcardSet>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

/// Save a generated deck as a new set.
pub async fn save_flashcards(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SaveFlashcardsRequest>, JsonRejection>,
) -> ApiResult<Json<SaveFlashcardsResponse>> {
    let Json(mut request) = payload?;

    if let Some(claimed) = request.user_id.as_deref() {
        if claimed != user.user_id {
            return Err(ApiError::forbidden("Cannot save flashcards for another user"));
        }
    }

    request.title = request.title.trim().to_string();
    request.flashcards.retain(|c| !c.question.trim().is_empty() && !c.answer.trim().is_empty());
    if request.title.is_empty() || request.flashcards.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let count = request.flashcards.len() as u64;
    if !state.subscriptions.can_create_flashcards(&user.user_id, count).await {
        metrics::record_limit_denied();
        return Err(ApiError::forbidden(
            "Flashcard limit reached for your plan. Upgrade to save more flashcards.",
        ));
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let set = state
        .flashcards
        .save_with_cards(&user.user_id, &request.title, description, &request.flashcards)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save flashcard set: {}", e)))?;

    metrics::record_set_saved(request.flashcards.len());
    info!(user_id = %user.user_id, set_id = %set.id, cards = count, "Flashcard set saved");

    Ok(Json(SaveFlashcardsResponse {
        success: true,
        set_id: set.id,
        message: "Flashcard set saved successfully".to_string(),
    }))
}

/// The caller's sets with their cards, newest first.
pub async fn list_flashcard_sets(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<FlashcardSetsResponse>> {
    let sets = state.flashcards.list_with_cards(&user.user_id).await?;
    Ok(Json(FlashcardSetsResponse { sets }))
}

async fn owned_set(state: &AppState, user: &AuthUser, set_id: &str) -> ApiResult<FlashcardSet> {
    state
        .flashcards
        .get_with_cards(&user.user_id, set_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Flashcard set not found"))
}

pub async fn get_flashcard_set(
    State(state): State<AppState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Json<FlashcardSet>> {
    Ok(Json(owned_set(&state, &user, &set_id).await?))
}

/// Anki import file for a stored set.
pub async fn export_flashcard_set(
    State(state): State<AppState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Response> {
    let set = owned_set(&state, &user, &set_id).await?;
    Ok(anki_attachment(&set.cards()))
}

/// Anki import file for cards that were never saved.
pub async fn export_flashcards(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    if request.flashcards.is_empty() {
        return Err(ApiError::bad_request("No flashcards to export"));
    }
    Ok(anki_attachment(&request.flashcards))
}

fn anki_attachment(cards: &[Flashcard]) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        to_anki_text(cards),
    )
        .into_response()
}
