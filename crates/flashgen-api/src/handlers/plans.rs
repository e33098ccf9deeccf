//! Plan catalog handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use flashgen_models::{Plan, FREE_TIER_MAX_FLASHCARDS};

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    pub plans: Vec<Plan>,
    pub free_tier_max_flashcards: i64,
}

/// List purchasable plans.
pub async fn list_plans(State(state): State<AppState>) -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: state.plans.plans().to_vec(),
        free_tier_max_flashcards: FREE_TIER_MAX_FLASHCARDS,
    })
}
