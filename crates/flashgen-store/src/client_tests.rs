//! Tests for the store client and repositories.

use std::time::Duration;

use reqwest::header::HeaderValue;
use serial_test::serial;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flashgen_models::{Flashcard, SubscriptionPatch, SubscriptionStatus};

use crate::client::{parse_content_range_total, StoreConfig, SupabaseClient};
use crate::error::StoreError;
use crate::flashcard_repo::FlashcardSetRepository;
use crate::query::Query;
use crate::retry::RetryConfig;
use crate::subscription_repo::SubscriptionRepository;
use crate::webhook_repo::WebhookEventRepository;

fn test_client(server: &MockServer) -> SupabaseClient {
    let config = StoreConfig {
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..StoreConfig::new(server.uri(), "service-key")
    };
    SupabaseClient::new(config).unwrap()
}

fn set_row(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "user-1",
        "title": "Biology",
        "description": null,
        "created_at": "2024-05-01T10:00:00+00:00"
    })
}

fn card_row(id: &str, set_id: &str, q: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "set_id": set_id,
        "question": q,
        "answer": "A",
        "created_at": "2024-05-01T10:00:01+00:00"
    })
}

// Error mapping

#[test]
fn test_error_from_http_status() {
    assert!(matches!(StoreError::from_http_status(401, "x"), StoreError::AuthError(_)));
    assert!(matches!(StoreError::from_http_status(404, "x"), StoreError::NotFound(_)));
    assert!(matches!(StoreError::from_http_status(409, "x"), StoreError::Conflict(_)));

    let err = StoreError::from_http_status(429, "x");
    assert!(matches!(err, StoreError::RateLimited(_)));
    assert!(err.is_retryable());

    let err = StoreError::from_http_status(503, "x");
    assert!(matches!(err, StoreError::ServerError(503, _)));
    assert!(err.is_retryable());

    let err = StoreError::from_http_status(400, "x");
    assert!(matches!(err, StoreError::RequestFailed(_)));
    assert!(!err.is_retryable());
    assert_eq!(err.http_status(), Some(400));
}

#[test]
fn test_parse_content_range_total() {
    assert_eq!(parse_content_range_total(Some(&HeaderValue::from_static("0-9/42"))).unwrap(), 42);
    assert_eq!(parse_content_range_total(Some(&HeaderValue::from_static("*/0"))).unwrap(), 0);
    assert!(parse_content_range_total(Some(&HeaderValue::from_static("0-9/*"))).is_err());
    assert!(parse_content_range_total(None).is_err());
}

// Configuration

#[test]
#[serial]
fn test_config_from_env_requires_url_and_key() {
    std::env::remove_var("SUPABASE_URL");
    std::env::remove_var("NEXT_PUBLIC_SUPABASE_URL");
    std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
    assert!(matches!(StoreConfig::from_env(), Err(StoreError::NotConfigured(_))));

    std::env::set_var("SUPABASE_URL", "https://abc.supabase.co/");
    assert!(matches!(StoreConfig::from_env(), Err(StoreError::NotConfigured(_))));

    std::env::set_var("SUPABASE_SERVICE_ROLE_KEY", "secret");
    std::env::remove_var("STORE_CONNECT_TIMEOUT_SECS");
    let config = StoreConfig::from_env().unwrap();
    assert_eq!(config.url, "https://abc.supabase.co");
    assert_eq!(config.connect_timeout, Duration::from_secs(5));

    std::env::remove_var("SUPABASE_URL");
    std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
}

// Client

#[tokio::test]
async fn test_select_sends_auth_headers_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([set_row("s2"), set_row("s1")])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    let sets = repo.list_sets("user-1").await.unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].id, "s2");
}

#[tokio::test]
async fn test_select_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .with_priority(2)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    assert!(repo.list_sets("user-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_requires_filter() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    let err = client.delete("flashcard_sets", &Query::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::RequestFailed(_)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    assert!(test_client(&server).health_check().await);

    let down = StoreConfig::new("http://127.0.0.1:1", "k");
    assert!(!SupabaseClient::new(down).unwrap().health_check().await);
}

// Flashcard sets

#[tokio::test]
async fn test_save_with_cards() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcard_sets"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({ "user_id": "user-1", "title": "Biology" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([set_row("set-1")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcards"))
        .and(body_partial_json(serde_json::json!([
            { "set_id": "set-1", "question": "Q1", "answer": "A1" },
            { "set_id": "set-1", "question": "Q2", "answer": "A2" }
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            card_row("c1", "set-1", "Q1"),
            card_row("c2", "set-1", "Q2")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    let cards = vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")];
    let set = repo
        .save_with_cards("user-1", "Biology", None, &cards)
        .await
        .unwrap();
    assert_eq!(set.id, "set-1");
}

#[tokio::test]
async fn test_save_with_cards_removes_set_when_cards_fail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcard_sets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([set_row("set-1")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcards"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid input"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/flashcard_sets"))
        .and(query_param("id", "eq.set-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    let err = repo
        .save_with_cards("user-1", "Biology", None, &[Flashcard::new("Q", "A")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RequestFailed(_)));
}

#[tokio::test]
async fn test_list_with_cards_degrades_per_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([set_row("s1"), set_row("s2")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcards"))
        .and(query_param("set_id", "eq.s1"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            card_row("c1", "s1", "Q1"),
            card_row("c2", "s1", "Q2")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcards"))
        .and(query_param("set_id", "eq.s2"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    let sets = repo.list_with_cards("user-1").await.unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].card_count, 2);
    assert_eq!(sets[0].flashcards[0].question, "Q1");
    assert_eq!(sets[1].card_count, 0);
}

#[tokio::test]
async fn test_get_with_cards_not_owned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .and(query_param("id", "eq.s9"))
        .and(query_param("user_id", "eq.user-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    assert!(repo.get_with_cards("user-2", "s9").await.unwrap().is_none());
}

#[tokio::test]
async fn test_count_cards_for_user() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/flashcards"))
        .and(query_param("select", "id,flashcard_sets!inner(user_id)"))
        .and(query_param("flashcard_sets.user_id", "eq.user-1"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/7"))
        .expect(1)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    assert_eq!(repo.count_cards_for_user("user-1").await.unwrap(), 7);
}

#[tokio::test]
async fn test_count_cards_query_size_does_not_grow_with_sets() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/flashcards"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/0"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/flashcard_sets"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    assert_eq!(repo.count_cards_for_user("user-1").await.unwrap(), 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.as_str().len() < 200);
}

#[tokio::test]
async fn test_insert_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcards"))
        .respond_with(ResponseTemplate::new(504))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/flashcards"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            card_row("c1", "set-1", "Q1")
        ])))
        .with_priority(2)
        .expect(0)
        .mount(&server)
        .await;

    let repo = FlashcardSetRepository::new(test_client(&server));
    let err = repo
        .insert_cards("set-1", &[Flashcard::new("Q1", "A")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ServerError(504, _)));
}

#[tokio::test]
async fn test_huge_retry_after_saturates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let repo = SubscriptionRepository::new(test_client(&server));
    let err = repo.active_for_user("user-1").await.unwrap_err();
    assert!(matches!(err, StoreError::RateLimited(u64::MAX)));
}

// Subscriptions and webhook log

#[tokio::test]
async fn test_active_subscription_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("status", "eq.active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "row-1",
            "user_id": "user-1",
            "lemonsqueezy_subscription_id": "sub-1",
            "plan_name": "Small",
            "status": "active"
        }])))
        .mount(&server)
        .await;

    let repo = SubscriptionRepository::new(test_client(&server));
    let sub = repo.active_for_user("user-1").await.unwrap().unwrap();
    assert_eq!(sub.plan_name, "Small");
    assert_eq!(sub.limits().max_flashcards, 100);
}

#[tokio::test]
async fn test_update_by_provider_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_subscriptions"))
        .and(query_param("lemonsqueezy_subscription_id", "eq.sub-1"))
        .and(body_partial_json(serde_json::json!({ "status": "expired" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "row-1",
            "user_id": "user-1",
            "lemonsqueezy_subscription_id": "sub-1",
            "plan_name": "Small",
            "status": "expired"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = SubscriptionRepository::new(test_client(&server));
    let updated = repo
        .update_by_provider_id("sub-1", &SubscriptionPatch::status(SubscriptionStatus::Expired))
        .await
        .unwrap();
    assert_eq!(updated, 1);
}

#[tokio::test]
async fn test_webhook_event_log_and_mark_processed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/webhook_events"))
        .and(header("prefer", "return=minimal"))
        .and(body_partial_json(serde_json::json!({
            "lemonsqueezy_id": "evt-1",
            "event_name": "subscription_created",
            "processed": false
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/webhook_events"))
        .and(query_param("lemonsqueezy_id", "eq.evt-1"))
        .and(body_partial_json(serde_json::json!({ "processed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = WebhookEventRepository::new(test_client(&server));
    let payload = serde_json::json!({ "meta": { "event_name": "subscription_created" } });
    repo.log(Some("evt-1"), "subscription_created", &payload)
        .await
        .unwrap();
    repo.mark_processed("evt-1").await.unwrap();
}
