//! Checkout and payment webhook handlers.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use validator::Validate;

use flashgen_models::WebhookEvent;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::{verify_signature, CheckoutRequest};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(default)]
    #[validate(length(min = 1, message = "variantId is required"))]
    pub variant_id: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(url(message = "returnUrl must be a valid URL"))]
    pub return_url: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
}

/// Start a hosted checkout for one of the catalog plans.
pub async fn create_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutBody>, JsonRejection>,
) -> ApiResult<Json<CheckoutResponse>> {
    let Json(body) = payload?;
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let variant_id = body.variant_id.trim().to_string();
    if state.plans.by_variant(&variant_id).is_none() {
        return Err(ApiError::bad_request("Unknown plan variant"));
    }

    let request = CheckoutRequest {
        variant_id,
        email: body.email.trim().to_string(),
        return_url: body.return_url,
    };

    match state.billing.create_checkout(&request).await {
        Ok(url) => {
            metrics::record_checkout("created");
            Ok(Json(CheckoutResponse { url }))
        }
        Err(e) => {
            metrics::record_checkout("failed");
            error!("Checkout creation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Verify and apply a LemonSqueezy webhook.
pub async fn lemonsqueezy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    else {
        metrics::record_webhook_rejected("missing");
        return Err(ApiError::bad_request("Missing signature"));
    };

    let secret = &state.billing.config().webhook_secret;
    if !verify_signature(secret, &body, signature) {
        warn!("Rejected webhook with invalid signature");
        metrics::record_webhook_rejected("invalid");
        return Err(ApiError::unauthorized("Invalid signature"));
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid webhook payload: {}", e)))?;
    let event: WebhookEvent = serde_json::from_value(payload.clone())
        .map_err(|e| ApiError::bad_request(format!("Invalid webhook payload: {}", e)))?;

    state.webhooks.process(&payload, &event).await.map_err(|e| {
        error!(event = %event.meta.event_name, "Webhook error: {}", e);
        ApiError::internal("Internal server error")
    })?;

    Ok(Json(WebhookResponse {
        message: "Webhook processed successfully".to_string(),
    }))
}
