//! Supabase REST client.
//!
//! Production-grade client with:
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, CONTENT_RANGE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_request;
use crate::query::Query;
use crate::retry::{with_retry, RetryConfig};
use crate::users::AuthUserRecord;

/// Store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service role key (bypasses row level security)
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Config with default timeouts for a project URL and key.
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_SUPABASE_URL"))
            .map_err(|_| StoreError::not_configured("SUPABASE_URL must be set"))?;
        if url.trim().is_empty() {
            return Err(StoreError::not_configured("SUPABASE_URL cannot be empty"));
        }

        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| StoreError::not_configured("SUPABASE_SERVICE_ROLE_KEY must be set"))?;
        if service_key.trim().is_empty() {
            return Err(StoreError::not_configured(
                "SUPABASE_SERVICE_ROLE_KEY cannot be empty",
            ));
        }

        let timeout_secs: u64 = std::env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let connect_timeout_secs: u64 = std::env::var("STORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            ..Self::new(url, service_key)
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<AuthUserRecord>,
}

/// Supabase REST client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: StoreConfig,
}

impl SupabaseClient {
    /// Create a new client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("flashgen-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// Rows matching `query`.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> StoreResult<Vec<T>> {
        let url = self.table_url(table);

        self.execute_request(
            "select",
            table,
            with_retry(&self.config.retry, "select", || async {
                let response = self
                    .authed(self.http.get(&url))
                    .query(query.params())
                    .send()
                    .await?;
                Self::read_json(response, &url).await
            }),
        )
        .await
    }

    /// Insert one row (or an array of rows) and return the stored rows.
    ///
    /// Inserts are never retried.
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);

        // Sent once: a failed POST may already have been committed.
        self.execute_request("insert", table, async {
            let response = self
                .authed(self.http.post(&url))
                .header("Prefer", "return=representation")
                .json(rows)
                .send()
                .await?;
            Self::read_json(response, &url).await
        })
        .await
    }

    /// Insert without reading the rows back.
    pub async fn insert_minimal<B>(&self, table: &str, rows: &B) -> StoreResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.table_url(table);

        self.execute_request("insert", table, async {
            let response = self
                .authed(self.http.post(&url))
                .header("Prefer", "return=minimal")
                .json(rows)
                .send()
                .await?;
            Self::expect_success(response, &url).await
        })
        .await
    }

    /// Patch rows matching `filter` and return them.
    pub async fn update<B, T>(&self, table: &str, filter: &Query, patch: &B) -> StoreResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Self::require_filter("update", filter)?;
        let url = self.table_url(table);

        self.execute_request(
            "update",
            table,
            with_retry(&self.config.retry, "update", || async {
                let response = self
                    .authed(self.http.patch(&url))
                    .query(filter.params())
                    .header("Prefer", "return=representation")
                    .json(patch)
                    .send()
                    .await?;
                Self::read_json(response, &url).await
            }),
        )
        .await
    }

    /// Delete rows matching `filter`.
    pub async fn delete(&self, table: &str, filter: &Query) -> StoreResult<()> {
        Self::require_filter("delete", filter)?;
        let url = self.table_url(table);

        self.execute_request(
            "delete",
            table,
            with_retry(&self.config.retry, "delete", || async {
                let response = self
                    .authed(self.http.delete(&url))
                    .query(filter.params())
                    .send()
                    .await?;
                Self::expect_success(response, &url).await
            }),
        )
        .await
    }

    /// Exact row count for `filter`.
    pub async fn count(&self, table: &str, filter: &Query) -> StoreResult<u64> {
        let url = self.table_url(table);

        self.execute_request(
            "count",
            table,
            with_retry(&self.config.retry, "count", || async {
                let response = self
                    .authed(self.http.head(&url))
                    .query(filter.params())
                    .header("Prefer", "count=exact")
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Self::handle_error_response(status, &url, response).await);
                }
                parse_content_range_total(response.headers().get(CONTENT_RANGE))
            }),
        )
        .await
    }

    /// One page of auth users (admin API, 1-based pages).
    pub async fn list_auth_users(&self, page: u32, per_page: u32) -> StoreResult<Vec<AuthUserRecord>> {
        let url = format!("{}/auth/v1/admin/users", self.config.url);

        self.execute_request(
            "list_users",
            "auth.users",
            with_retry(&self.config.retry, "list_users", || async {
                let response = self
                    .authed(self.http.get(&url))
                    .query(&[("page", page), ("per_page", per_page)])
                    .send()
                    .await?;
                let list: UserListResponse = Self::read_json(response, &url).await?;
                Ok(list.users)
            }),
        )
        .await
    }

    /// Whether PostgREST answers.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/rest/v1/", self.config.url);
        match self.authed(self.http.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Store health check error: {}", e);
                false
            }
        }
    }

    fn require_filter(operation: &str, filter: &Query) -> StoreResult<()> {
        if filter.is_empty() {
            return Err(StoreError::request_failed(format!(
                "{} without a filter is not allowed",
                operation
            )));
        }
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, url, response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn expect_success(response: Response, url: &str) -> StoreResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::handle_error_response(status, url, response).await)
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, table: &str, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = info_span!("store_request", operation = %operation, table = %table);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> StoreError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or(1000);
            return StoreError::RateLimited(retry_after_ms);
        }
        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

/// Total from a `Content-Range: 0-9/42` (or `*/42`) header.
pub(crate) fn parse_content_range_total(header: Option<&HeaderValue>) -> StoreResult<u64> {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.rsplit('/').next())
        .and_then(|total| total.trim().parse().ok())
        .ok_or_else(|| StoreError::InvalidResponse("missing or invalid Content-Range".to_string()))
}
