//! Payment webhook processing.
//!
//! Every verified event is logged to `webhook_events`, applied to
//! `user_subscriptions` and then marked processed.

use std::sync::Arc;

use tracing::{info, warn};

use flashgen_models::{
    NewUserSubscription, PlanCatalog, SubscriptionPatch, SubscriptionStatus, WebhookEvent,
    WebhookEventName,
};
use flashgen_store::{
    StoreResult, SubscriptionRepository, UserDirectory, WebhookEventRepository,
};

use crate::metrics;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Subscription rows were written.
    Applied,
    /// The event was understood but nothing could be written (missing user,
    /// email or subscription id).
    Skipped(String),
    /// Event name with no handler.
    Unhandled(String),
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Skipped(_) => "skipped",
            WebhookOutcome::Unhandled(_) => "unhandled",
        }
    }
}

#[derive(Clone)]
pub struct WebhookProcessor {
    events: WebhookEventRepository,
    subscriptions: SubscriptionRepository,
    users: UserDirectory,
    plans: Arc<PlanCatalog>,
}

impl WebhookProcessor {
    pub fn new(
        events: WebhookEventRepository,
        subscriptions: SubscriptionRepository,
        users: UserDirectory,
        plans: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            events,
            subscriptions,
            users,
            plans,
        }
    }

    /// Log, apply and mark one event.
    pub async fn process(
        &self,
        payload: &serde_json::Value,
        event: &WebhookEvent,
    ) -> StoreResult<WebhookOutcome> {
        let event_id = event.event_id();
        let event_name = event.meta.event_name.as_str();

        self.events.log(event_id.as_deref(), event_name, payload).await?;

        let outcome = self.apply(event).await?;
        match &outcome {
            WebhookOutcome::Applied => {
                info!(event = %event_name, event_id = ?event_id, "Webhook applied")
            }
            WebhookOutcome::Skipped(reason) => {
                warn!(event = %event_name, event_id = ?event_id, "Webhook skipped: {}", reason)
            }
            WebhookOutcome::Unhandled(name) => {
                info!(event_id = ?event_id, "Unhandled event type: {}", name)
            }
        }
        metrics::record_webhook_event(event_name, outcome.label());

        if let Some(id) = event_id.as_deref() {
            self.events.mark_processed(id).await?;
        }
        Ok(outcome)
    }

    async fn apply(&self, event: &WebhookEvent) -> StoreResult<WebhookOutcome> {
        let attributes = &event.data.attributes;

        let patch = match event.name() {
            WebhookEventName::SubscriptionCreated => return self.create_subscription(event).await,
            WebhookEventName::SubscriptionUpdated => SubscriptionPatch {
                status: attributes.status.clone(),
                ..Default::default()
            }
            .with_period_start(attributes.renews_at)
            .with_period_end(attributes.ends_at),
            WebhookEventName::SubscriptionCancelled => {
                SubscriptionPatch::status(SubscriptionStatus::Cancelled)
                    .with_period_end(attributes.ends_at)
            }
            WebhookEventName::SubscriptionResumed | WebhookEventName::SubscriptionUnpaused => {
                SubscriptionPatch::status(SubscriptionStatus::Active)
                    .with_period_start(attributes.renews_at)
                    .with_period_end(attributes.ends_at)
            }
            WebhookEventName::SubscriptionExpired => {
                SubscriptionPatch::status(SubscriptionStatus::Expired)
            }
            WebhookEventName::SubscriptionPaused => {
                SubscriptionPatch::status(SubscriptionStatus::Paused)
            }
            WebhookEventName::Unknown(name) => return Ok(WebhookOutcome::Unhandled(name)),
        };

        let Some(subscription_id) = event.subscription_id() else {
            return Ok(WebhookOutcome::Skipped("event has no subscription id".to_string()));
        };

        let rows = self
            .subscriptions
            .update_by_provider_id(subscription_id, &patch)
            .await?;
        if rows == 0 {
            return Ok(WebhookOutcome::Skipped(format!(
                "no subscription row for {}",
                subscription_id
            )));
        }
        Ok(WebhookOutcome::Applied)
    }

    async fn create_subscription(&self, event: &WebhookEvent) -> StoreResult<WebhookOutcome> {
        let attributes = &event.data.attributes;

        let Some(email) = attributes.user_email.as_deref().filter(|e| !e.is_empty()) else {
            return Ok(WebhookOutcome::Skipped(
                "no user email found in subscription data".to_string(),
            ));
        };
        let Some(subscription_id) = event.subscription_id() else {
            return Ok(WebhookOutcome::Skipped("event has no subscription id".to_string()));
        };
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(WebhookOutcome::Skipped(format!("user not found with email {}", email)));
        };

        let plan_name = attributes
            .variant_id
            .as_deref()
            .map(|v| self.plans.plan_name_for_variant(v))
            .unwrap_or("Unknown");

        let row = NewUserSubscription {
            user_id: user.id,
            lemonsqueezy_subscription_id: subscription_id.to_string(),
            lemonsqueezy_customer_id: attributes.customer_id.clone(),
            variant_id: attributes.variant_id.clone(),
            plan_name: plan_name.to_string(),
            status: attributes.status.clone().unwrap_or(SubscriptionStatus::Active),
            current_period_start: attributes.renews_at,
            current_period_end: attributes.ends_at,
        };
        self.subscriptions.create(&row).await?;
        Ok(WebhookOutcome::Applied)
    }
}
