//! LemonSqueezy webhook payloads.
//!
//! Only the fields the subscription handlers read are modelled. The raw
//! payload is kept separately for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::subscription::SubscriptionStatus;

/// Event names the consumer acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventName {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCancelled,
    SubscriptionResumed,
    SubscriptionExpired,
    SubscriptionPaused,
    SubscriptionUnpaused,
    Unknown(String),
}

impl WebhookEventName {
    pub fn parse(name: &str) -> Self {
        match name {
            "subscription_created" => Self::SubscriptionCreated,
            "subscription_updated" => Self::SubscriptionUpdated,
            "subscription_cancelled" => Self::SubscriptionCancelled,
            "subscription_resumed" => Self::SubscriptionResumed,
            "subscription_expired" => Self::SubscriptionExpired,
            "subscription_paused" => Self::SubscriptionPaused,
            "subscription_unpaused" => Self::SubscriptionUnpaused,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMeta {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub custom_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: SubscriptionAttributes,
}

/// Subscription object attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionAttributes {
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub variant_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub renews_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

/// A webhook event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub meta: WebhookMeta,
    #[serde(default)]
    pub data: WebhookData,
}

impl WebhookEvent {
    pub fn name(&self) -> WebhookEventName {
        WebhookEventName::parse(&self.meta.event_name)
    }

    /// `meta.custom_data.event_id`, falling back to `data.id`.
    pub fn event_id(&self) -> Option<String> {
        self.meta
            .custom_data
            .as_ref()
            .and_then(|c| c.get("event_id"))
            .and_then(value_as_string)
            .or_else(|| self.data.id.clone())
    }

    /// Provider subscription id.
    pub fn subscription_id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }
}

fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// LemonSqueezy sends ids as numbers in attributes and as strings in `data.id`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "meta": {
                "event_name": "subscription_created",
                "custom_data": { "user_email": "a@example.com" }
            },
            "data": {
                "type": "subscriptions",
                "id": "1",
                "attributes": {
                    "store_id": 1,
                    "customer_id": 42,
                    "variant_id": 568246,
                    "user_email": "a@example.com",
                    "status": "active",
                    "renews_at": "2024-06-01T00:00:00.000000Z",
                    "ends_at": null
                }
            }
        })
    }

    #[test]
    fn test_parse_subscription_created() {
        let event: WebhookEvent = serde_json::from_value(sample()).unwrap();
        assert_eq!(event.name(), WebhookEventName::SubscriptionCreated);
        assert_eq!(event.subscription_id(), Some("1"));
        let attrs = &event.data.attributes;
        assert_eq!(attrs.variant_id.as_deref(), Some("568246"));
        assert_eq!(attrs.customer_id.as_deref(), Some("42"));
        assert_eq!(attrs.user_email.as_deref(), Some("a@example.com"));
        assert_eq!(attrs.status, Some(SubscriptionStatus::Active));
        assert!(attrs.renews_at.is_some());
        assert!(attrs.ends_at.is_none());
    }

    #[test]
    fn test_event_id_fallback() {
        let event: WebhookEvent = serde_json::from_value(sample()).unwrap();
        assert_eq!(event.event_id().as_deref(), Some("1"));

        let mut raw = sample();
        raw["meta"]["custom_data"]["event_id"] = serde_json::json!("evt_77");
        let event: WebhookEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_id().as_deref(), Some("evt_77"));
    }

    #[test]
    fn test_unknown_event_and_sparse_payload() {
        let event: WebhookEvent =
            serde_json::from_value(serde_json::json!({ "meta": { "event_name": "order_created" } }))
                .unwrap();
        assert_eq!(
            event.name(),
            WebhookEventName::Unknown("order_created".to_string())
        );
        assert_eq!(event.event_id(), None);
        assert!(event.data.attributes.user_email.is_none());
    }
}
