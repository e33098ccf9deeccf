//! Repository for the payment webhook event log.

use serde::Serialize;

use crate::client::SupabaseClient;
use crate::error::StoreResult;
use crate::query::Query;

const TABLE: &str = "webhook_events";

#[derive(Debug, Serialize)]
struct NewWebhookEvent<'a> {
    lemonsqueezy_id: Option<&'a str>,
    event_name: &'a str,
    data: &'a serde_json::Value,
    processed: bool,
}

#[derive(Debug, Serialize)]
struct ProcessedPatch {
    processed: bool,
}

/// Repository for the `webhook_events` table.
#[derive(Clone)]
pub struct WebhookEventRepository {
    client: SupabaseClient,
}

impl WebhookEventRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Record a received event as unprocessed.
    pub async fn log(
        &self,
        event_id: Option<&str>,
        event_name: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<()> {
        let row = NewWebhookEvent {
            lemonsqueezy_id: event_id,
            event_name,
            data: payload,
            processed: false,
        };
        self.client.insert_minimal(TABLE, &row).await
    }

    pub async fn mark_processed(&self, event_id: &str) -> StoreResult<()> {
        let filter = Query::new().eq("lemonsqueezy_id", event_id);
        let _: Vec<serde_json::Value> = self
            .client
            .update(TABLE, &filter, &ProcessedPatch { processed: true })
            .await?;
        Ok(())
    }
}
