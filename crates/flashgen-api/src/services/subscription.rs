//! Plan limits and usage.

use serde::Serialize;
use tracing::warn;

use flashgen_models::{FlashcardLimits, PlanTier, UserSubscription};
use flashgen_store::{FlashcardSetRepository, StoreResult, SubscriptionRepository};

/// A user's plan, limits and current usage.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub subscription: Option<UserSubscription>,
    pub plan_name: String,
    pub limits: FlashcardLimits,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub flashcards_used: u64,
    /// `None` when the plan is unlimited
    pub flashcards_remaining: Option<u64>,
}

/// Resolves plan limits from the subscription table.
#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: SubscriptionRepository,
    flashcards: FlashcardSetRepository,
}

impl SubscriptionService {
    pub fn new(subscriptions: SubscriptionRepository, flashcards: FlashcardSetRepository) -> Self {
        Self {
            subscriptions,
            flashcards,
        }
    }

    /// Active subscription and the limits it grants. No subscription means
    /// the free tier.
    pub async fn limits(
        &self,
        user_id: &str,
    ) -> StoreResult<(Option<UserSubscription>, FlashcardLimits)> {
        let subscription = self.subscriptions.active_for_user(user_id).await?;
        let limits = subscription
            .as_ref()
            .map(UserSubscription::limits)
            .unwrap_or_else(|| PlanTier::Free.limits());
        Ok((subscription, limits))
    }

    pub async fn summary(&self, user_id: &str) -> StoreResult<SubscriptionSummary> {
        let (subscription, limits) = self.limits(user_id).await?;
        let used = self.flashcards.count_cards_for_user(user_id).await?;
        let plan_name = subscription
            .as_ref()
            .map(|s| s.plan_name.clone())
            .unwrap_or_else(|| PlanTier::Free.name().to_string());

        Ok(SubscriptionSummary {
            subscription,
            plan_name,
            limits,
            usage: Usage {
                flashcards_used: used,
                flashcards_remaining: limits.remaining(used),
            },
        })
    }

    /// Whether `additional` cards fit in the user's plan.
    ///
    /// Lookup failures deny.
    pub async fn can_create_flashcards(&self, user_id: &str, additional: u64) -> bool {
        let limits = match self.limits(user_id).await {
            Ok((_, limits)) => limits,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Subscription lookup failed, denying");
                return false;
            }
        };

        if limits.has_unlimited_flashcards {
            return true;
        }

        match self.flashcards.count_cards_for_user(user_id).await {
            Ok(used) => limits.allows(used, additional),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Flashcard count failed, denying");
                false
            }
        }
    }
}
