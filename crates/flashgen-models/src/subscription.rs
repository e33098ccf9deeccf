//! User subscription records.

use chrono::{DateTime, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::plan::{FlashcardLimits, PlanTier};

/// Subscription status as reported by the payment provider.
///
/// Statuses this crate does not know are kept verbatim in `Other` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    OnTrial,
    Active,
    Paused,
    PastDue,
    Unpaid,
    Cancelled,
    Expired,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::OnTrial => "on_trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "on_trial" => SubscriptionStatus::OnTrial,
            "active" => SubscriptionStatus::Active,
            "paused" => SubscriptionStatus::Paused,
            "past_due" => SubscriptionStatus::PastDue,
            "unpaid" => SubscriptionStatus::Unpaid,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Other(raw),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for SubscriptionStatus {
    fn schema_name() -> String {
        "SubscriptionStatus".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Stored subscription row (`user_subscriptions` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserSubscription {
    pub id: String,
    pub user_id: String,
    pub lemonsqueezy_subscription_id: String,
    #[serde(default)]
    pub lemonsqueezy_customer_id: Option<String>,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserSubscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn tier(&self) -> PlanTier {
        PlanTier::from_plan_name(Some(&self.plan_name))
    }

    pub fn limits(&self) -> FlashcardLimits {
        self.tier().limits()
    }
}

/// Insert payload for a new subscription row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserSubscription {
    pub user_id: String,
    pub lemonsqueezy_subscription_id: String,
    pub lemonsqueezy_customer_id: Option<String>,
    pub variant_id: Option<String>,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Partial update of a subscription row. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_start: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<Option<DateTime<Utc>>>,
}

impl SubscriptionPatch {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_period_start(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.current_period_start = Some(start);
        self
    }

    pub fn with_period_end(mut self, end: Option<DateTime<Utc>>) -> Self {
        self.current_period_end = Some(end);
        self
    }
}
