//! Subscription status handler.

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::SubscriptionSummary;
use crate::state::AppState;

/// The caller's subscription, limits and usage.
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SubscriptionSummary>> {
    let summary = state.subscriptions.summary(&user.user_id).await?;
    Ok(Json(summary))
}
