//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "flashgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "flashgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "flashgen_http_requests_in_flight";

    // Rate limiting
    pub const RATE_LIMIT_HITS_TOTAL: &str = "flashgen_rate_limit_hits_total";

    // Billing
    pub const WEBHOOK_EVENTS_TOTAL: &str = "flashgen_webhook_events_total";
    pub const WEBHOOK_REJECTED_TOTAL: &str = "flashgen_webhook_rejected_total";
    pub const CHECKOUTS_TOTAL: &str = "flashgen_checkouts_total";

    // Storage
    pub const FLASHCARD_SETS_SAVED_TOTAL: &str = "flashgen_flashcard_sets_saved_total";
    pub const FLASHCARD_LIMIT_DENIED_TOTAL: &str = "flashgen_flashcard_limit_denied_total";
}

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static SET_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/flashcard-sets/[^/]+").unwrap());

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

pub fn record_webhook_event(event_name: &str, outcome: &str) {
    let labels = [
        ("event", event_name.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::WEBHOOK_EVENTS_TOTAL, &labels).increment(1);
}

/// Record a webhook rejected before processing (`missing` or `invalid`).
pub fn record_webhook_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::WEBHOOK_REJECTED_TOTAL, &labels).increment(1);
}

pub fn record_checkout(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CHECKOUTS_TOTAL, &labels).increment(1);
}

pub fn record_set_saved(cards: usize) {
    counter!(names::FLASHCARD_SETS_SAVED_TOTAL).increment(1);
    histogram!("flashgen_flashcard_set_size").record(cards as f64);
}

pub fn record_limit_denied() {
    counter!(names::FLASHCARD_LIMIT_DENIED_TOTAL).increment(1);
}

/// Replace ids in a path so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, ":id");
    SET_SEGMENT
        .replace_all(&path, "/flashcard-sets/:set_id")
        .into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
