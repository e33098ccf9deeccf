//! API configuration.

use std::time::Duration;

use flashgen_models::{PlanCatalog, PlanTier};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Per-IP requests per second on `/api`
    pub rate_limit_rps: u32,
    /// Request timeout. Video generation runs inside one request, so this is
    /// long.
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(600),
            max_body_size: 2 * 1024 * 1024,
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            request_timeout: std::env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Bearer token verification settings.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth provider
    pub jwt_secret: String,
    /// Expected `aud` claim
    pub audience: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            audience: "authenticated".to_string(),
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("SUPABASE_JWT_SECRET").unwrap_or_default());
        if let Ok(audience) = std::env::var("SUPABASE_JWT_AUDIENCE") {
            if !audience.trim().is_empty() {
                config.audience = audience;
            }
        }
        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

/// Payment provider settings.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub api_key: String,
    pub api_url: String,
    pub store_id: String,
    /// HMAC secret for webhook signatures
    pub webhook_secret: String,
    pub timeout: Duration,
    /// Variant id overrides per tier
    pub small_variant_id: Option<String>,
    pub mid_variant_id: Option<String>,
    pub big_variant_id: Option<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.lemonsqueezy.com/v1".to_string(),
            store_id: "1".to_string(),
            webhook_secret: String::new(),
            timeout: Duration::from_secs(30),
            small_variant_id: None,
            mid_variant_id: None,
            big_variant_id: None,
        }
    }
}

impl BillingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty("LEMONSQUEEZY_API_KEY").unwrap_or(defaults.api_key),
            api_url: non_empty("LEMONSQUEEZY_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            store_id: non_empty("LEMONSQUEEZY_STORE_ID").unwrap_or(defaults.store_id),
            webhook_secret: non_empty("LEMONSQUEEZY_WEBHOOK_SECRET")
                .unwrap_or(defaults.webhook_secret),
            timeout: std::env::var("LEMONSQUEEZY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            small_variant_id: non_empty("LEMONSQUEEZY_SMALL_VARIANT_ID"),
            mid_variant_id: non_empty("LEMONSQUEEZY_MID_VARIANT_ID"),
            big_variant_id: non_empty("LEMONSQUEEZY_BIG_VARIANT_ID"),
        }
    }

    /// Plan catalog with any configured variant overrides applied.
    pub fn plan_catalog(&self) -> PlanCatalog {
        let overrides = [
            (PlanTier::Small, &self.small_variant_id),
            (PlanTier::Mid, &self.mid_variant_id),
            (PlanTier::Big, &self.big_variant_id),
        ];
        overrides
            .into_iter()
            .fold(PlanCatalog::default(), |catalog, (tier, id)| match id {
                Some(id) => catalog.with_variant(tier, id.clone()),
                None => catalog,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert!(!config.is_production());
        assert!(config.metrics_enabled);
    }

    #[test]
    #[serial]
    fn test_api_from_env() {
        std::env::set_var("API_PORT", "9100");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example,");
        std::env::set_var("ENVIRONMENT", "Production");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 9100);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.is_production());

        std::env::remove_var("API_PORT");
        std::env::remove_var("CORS_ORIGINS");
        std::env::remove_var("ENVIRONMENT");
    }

    #[test]
    fn test_auth_config() {
        let config = AuthConfig::new("secret");
        assert_eq!(config.audience, "authenticated");
        assert!(config.is_configured());
        assert!(!AuthConfig::default().is_configured());
    }

    #[test]
    fn test_plan_catalog_overrides() {
        let config = BillingConfig {
            mid_variant_id: Some("999".to_string()),
            ..Default::default()
        };
        let catalog = config.plan_catalog();
        assert_eq!(catalog.plan_name_for_variant("999"), "Mid");
        assert_eq!(catalog.plan_name_for_variant("568257"), "Unknown");
        assert_eq!(catalog.plan_name_for_variant("568246"), "Small");
    }
}
