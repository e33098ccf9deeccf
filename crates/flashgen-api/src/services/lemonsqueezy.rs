//! LemonSqueezy client: hosted checkout creation and webhook signatures.

use hmac::{Hmac, Mac};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BillingConfig;

const JSON_API: &str = "application/vnd.api+json";
const RECEIPT_BUTTON_TEXT: &str = "Go to Dashboard";

type HmacSha256 = Hmac<Sha256>;

pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("LemonSqueezy API key is not set")]
    NotConfigured,

    /// Non-2xx response carrying the provider's message.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Invalid checkout response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A checkout for one variant.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub variant_id: String,
    pub email: String,
    pub return_url: String,
}

#[derive(Serialize)]
struct CheckoutBody<'a> {
    data: CheckoutData<'a>,
}

#[derive(Serialize)]
struct CheckoutData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: CheckoutAttributes<'a>,
    relationships: CheckoutRelationships<'a>,
}

#[derive(Serialize)]
struct CheckoutAttributes<'a> {
    checkout_options: CheckoutOptions,
    checkout_data: CheckoutCustomerData<'a>,
    product_options: ProductOptions<'a>,
}

#[derive(Serialize)]
struct CheckoutOptions {
    embed: bool,
    media: bool,
    logo: bool,
}

#[derive(Serialize)]
struct CheckoutCustomerData<'a> {
    email: &'a str,
    custom: CustomData<'a>,
}

#[derive(Serialize)]
struct CustomData<'a> {
    user_email: &'a str,
}

#[derive(Serialize)]
struct ProductOptions<'a> {
    enabled_variants: [&'a str; 1],
    redirect_url: &'a str,
    receipt_button_text: &'static str,
    receipt_link_url: &'a str,
}

#[derive(Serialize)]
struct CheckoutRelationships<'a> {
    store: Relationship<'a>,
    variant: Relationship<'a>,
}

#[derive(Serialize)]
struct Relationship<'a> {
    data: ResourceId<'a>,
}

#[derive(Serialize)]
struct ResourceId<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    data: CheckoutResponseData,
}

#[derive(Deserialize)]
struct CheckoutResponseData {
    attributes: CheckoutResponseAttributes,
}

#[derive(Deserialize)]
struct CheckoutResponseAttributes {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    detail: Option<String>,
    title: Option<String>,
}

/// JSON:API client for the LemonSqueezy REST API.
pub struct LemonSqueezyClient {
    http: Client,
    config: BillingConfig,
}

impl LemonSqueezyClient {
    pub fn new(config: BillingConfig) -> BillingResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Create a hosted checkout and return its URL.
    pub async fn create_checkout(&self, request: &CheckoutRequest) -> BillingResult<String> {
        if self.config.api_key.is_empty() {
            return Err(BillingError::NotConfigured);
        }

        let body = CheckoutBody {
            data: CheckoutData {
                kind: "checkouts",
                attributes: CheckoutAttributes {
                    checkout_options: CheckoutOptions {
                        embed: false,
                        media: false,
                        logo: true,
                    },
                    checkout_data: CheckoutCustomerData {
                        email: &request.email,
                        custom: CustomData {
                            user_email: &request.email,
                        },
                    },
                    product_options: ProductOptions {
                        enabled_variants: [&request.variant_id],
                        redirect_url: &request.return_url,
                        receipt_button_text: RECEIPT_BUTTON_TEXT,
                        receipt_link_url: &request.return_url,
                    },
                },
                relationships: CheckoutRelationships {
                    store: Relationship {
                        data: ResourceId {
                            kind: "stores",
                            id: &self.config.store_id,
                        },
                    },
                    variant: Relationship {
                        data: ResourceId {
                            kind: "variants",
                            id: &request.variant_id,
                        },
                    },
                },
            },
        };

        let payload = serde_json::to_vec(&body)
            .map_err(|e| BillingError::InvalidResponse(e.to_string()))?;

        let response = self
            .http
            .post(format!("{}/checkouts", self.config.api_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = provider_message(status.as_u16(), &text);
            warn!(status = status.as_u16(), "Checkout creation failed: {}", message);
            return Err(BillingError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CheckoutResponse = serde_json::from_str(&text)
            .map_err(|e| BillingError::InvalidResponse(e.to_string()))?;
        let url = parsed
            .data
            .attributes
            .url
            .ok_or_else(|| BillingError::InvalidResponse("missing checkout url".to_string()))?;

        info!(variant_id = %request.variant_id, "Created checkout");
        Ok(url)
    }
}

fn provider_message(status: u16, body: &str) -> String {
    let from_errors = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| {
        b.errors
            .into_iter()
            .find_map(|e| e.detail.or(e.title))
    });

    match from_errors {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("LemonSqueezy API error (status {})", status),
    }
}

/// Check a hex HMAC-SHA256 signature of `payload`.
///
/// The digest comparison is constant time. An empty secret never verifies.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn client(server: &MockServer) -> LemonSqueezyClient {
        LemonSqueezyClient::new(BillingConfig {
            api_key: "ls-key".to_string(),
            api_url: server.uri(),
            store_id: "4242".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            variant_id: "568246".to_string(),
            email: "learner@example.com".to_string(),
            return_url: "https://app.example.com/dashboard".to_string(),
        }
    }

    #[test]
    fn test_verify_signature() {
        let payload = br#"{"meta":{"event_name":"subscription_created"}}"#;
        let signature = sign("whsec", payload);

        assert!(verify_signature("whsec", payload, &signature));
        assert!(verify_signature("whsec", payload, &signature.to_uppercase()));
        assert!(!verify_signature("other", payload, &signature));
        assert!(!verify_signature("whsec", b"tampered", &signature));
        assert!(!verify_signature("whsec", payload, "zz-not-hex"));
        assert!(!verify_signature("whsec", payload, &signature[..10]));
        assert!(!verify_signature("", payload, &sign("", payload)));
    }

    #[test]
    fn test_provider_message() {
        assert_eq!(
            provider_message(422, r#"{"errors":[{"title":"Unprocessable","detail":"The variant is invalid."}]}"#),
            "The variant is invalid."
        );
        assert_eq!(provider_message(500, "upstream down"), "upstream down");
        assert_eq!(provider_message(502, ""), "LemonSqueezy API error (status 502)");
    }

    #[tokio::test]
    async fn test_create_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkouts"))
            .and(header("authorization", "Bearer ls-key"))
            .and(header("content-type", JSON_API))
            .and(body_partial_json(serde_json::json!({
                "data": {
                    "type": "checkouts",
                    "attributes": {
                        "checkout_data": {
                            "email": "learner@example.com",
                            "custom": { "user_email": "learner@example.com" }
                        },
                        "product_options": {
                            "enabled_variants": ["568246"],
                            "redirect_url": "https://app.example.com/dashboard",
                            "receipt_link_url": "https://app.example.com/dashboard"
                        }
                    },
                    "relationships": {
                        "store": { "data": { "type": "stores", "id": "4242" } },
                        "variant": { "data": { "type": "variants", "id": "568246" } }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {
                    "type": "checkouts",
                    "id": "c1",
                    "attributes": { "url": "https://store.lemonsqueezy.com/checkout/custom/c1" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server).create_checkout(&checkout()).await.unwrap();
        assert_eq!(url, "https://store.lemonsqueezy.com/checkout/custom/c1");
    }

    #[tokio::test]
    async fn test_create_checkout_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkouts"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": [{ "detail": "The store does not exist." }]
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_checkout(&checkout()).await.unwrap_err();
        assert!(matches!(err, BillingError::Provider { status: 422, .. }));
        assert_eq!(err.to_string(), "The store does not exist.");
    }

    #[tokio::test]
    async fn test_create_checkout_not_configured() {
        let client = LemonSqueezyClient::new(BillingConfig::default()).unwrap();
        let err = client.create_checkout(&checkout()).await.unwrap_err();
        assert!(matches!(err, BillingError::NotConfigured));
    }
}
