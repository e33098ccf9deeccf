//! API routes.

use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::billing::{create_checkout, lemonsqueezy_webhook};
use crate::handlers::flashcards::{
    export_flashcard_set, export_flashcards, get_flashcard_set, list_flashcard_sets,
    save_flashcards,
};
use crate::handlers::generate::generate_flashcards;
use crate::handlers::plans::list_plans;
use crate::handlers::subscription::get_subscription;
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, handle_timeout_error, rate_limit_middleware, request_id, request_logging,
    security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let generation_routes = Router::new().route("/generate-flashcards", post(generate_flashcards));

    let flashcard_routes = Router::new()
        .route("/flashcards/save", post(save_flashcards))
        // Older clients post here
        .route("/save-flashcards", post(save_flashcards))
        .route("/flashcards/export", post(export_flashcards))
        .route("/flashcard-sets", get(list_flashcard_sets))
        .route("/flashcard-sets/:set_id", get(get_flashcard_set))
        .route("/flashcard-sets/:set_id/export", get(export_flashcard_set));

    let billing_routes = Router::new()
        .route("/plans", get(list_plans))
        .route("/subscription", get(get_subscription))
        .route("/lemonsqueezy/checkout", post(create_checkout));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(generation_routes)
        .merge(flashcard_routes)
        .merge(billing_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    // Provider retries must never be throttled
    let webhook_routes = Router::new().route("/lemonsqueezy/webhook", post(lemonsqueezy_webhook));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes.merge(webhook_routes))
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(state.config.request_timeout)),
        )
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
