//! Business logic services.

pub mod lemonsqueezy;
pub mod subscription;
pub mod webhook;

pub use lemonsqueezy::{verify_signature, BillingError, CheckoutRequest, LemonSqueezyClient};
pub use subscription::{SubscriptionService, SubscriptionSummary, Usage};
pub use webhook::{WebhookOutcome, WebhookProcessor};
