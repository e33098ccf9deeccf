//! Repository for user subscriptions.

use tracing::info;

use flashgen_models::{NewUserSubscription, SubscriptionPatch, UserSubscription};

use crate::client::SupabaseClient;
use crate::error::StoreResult;
use crate::query::{Order, Query};

const TABLE: &str = "user_subscriptions";

/// Repository for the `user_subscriptions` table.
#[derive(Clone)]
pub struct SubscriptionRepository {
    client: SupabaseClient,
}

impl SubscriptionRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// The user's most recent active subscription.
    pub async fn active_for_user(&self, user_id: &str) -> StoreResult<Option<UserSubscription>> {
        let query = Query::new()
            .select("*")
            .eq("user_id", user_id)
            .eq("status", "active")
            .order("created_at", Order::Desc)
            .limit(1);
        let mut rows: Vec<UserSubscription> = self.client.select(TABLE, &query).await?;
        Ok(rows.pop())
    }

    pub async fn create(&self, subscription: &NewUserSubscription) -> StoreResult<()> {
        self.client.insert_minimal(TABLE, subscription).await?;
        info!(
            user_id = %subscription.user_id,
            plan = %subscription.plan_name,
            "Created subscription record"
        );
        Ok(())
    }

    /// Patch rows for a provider subscription id. Returns the number of rows
    /// changed.
    pub async fn update_by_provider_id(
        &self,
        provider_subscription_id: &str,
        patch: &SubscriptionPatch,
    ) -> StoreResult<usize> {
        let filter = Query::new().eq("lemonsqueezy_subscription_id", provider_subscription_id);
        let rows: Vec<UserSubscription> = self.client.update(TABLE, &filter, patch).await?;
        Ok(rows.len())
    }
}
