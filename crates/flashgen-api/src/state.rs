//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use flashgen_ai::{AiConfig, OpenAiChatClient, WhisperClient};
use flashgen_media::YtDlpSource;
use flashgen_models::PlanCatalog;
use flashgen_pipeline::{FlashcardPipeline, PipelineConfig};
use flashgen_store::{
    FlashcardSetRepository, SubscriptionRepository, SupabaseClient, UserDirectory,
    WebhookEventRepository,
};

use crate::auth::JwtVerifier;
use crate::config::{ApiConfig, AuthConfig, BillingConfig};
use crate::services::{LemonSqueezyClient, SubscriptionService, WebhookProcessor};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub auth: Arc<JwtVerifier>,
    pub pipeline: Arc<FlashcardPipeline>,
    pub store: SupabaseClient,
    pub flashcards: FlashcardSetRepository,
    pub subscriptions: SubscriptionService,
    pub webhooks: WebhookProcessor,
    pub billing: Arc<LemonSqueezyClient>,
    pub plans: Arc<PlanCatalog>,
}

impl AppState {
    /// Build state from environment configuration.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store = SupabaseClient::from_env().context("store configuration")?;

        let ai = AiConfig::from_env();
        if !ai.is_configured() {
            warn!("OPENAI_API_KEY is not set, generation requests will fail");
        }

        let pipeline_config = PipelineConfig::from_env();
        tokio::fs::create_dir_all(&pipeline_config.work_dir)
            .await
            .with_context(|| format!("creating work dir {}", pipeline_config.work_dir.display()))?;

        let video = YtDlpSource::new(&pipeline_config.work_dir)
            .with_cookies(pipeline_config.cookies_path.clone());
        if !video.is_available() {
            warn!("yt-dlp not found in PATH, YouTube generation will fail");
        }

        let pipeline = FlashcardPipeline::new(
            Arc::new(video),
            Arc::new(WhisperClient::new(ai.clone())?),
            Arc::new(OpenAiChatClient::new(ai)?),
            pipeline_config,
        );

        let billing = BillingConfig::from_env();
        if billing.webhook_secret.is_empty() {
            warn!("LEMONSQUEEZY_WEBHOOK_SECRET is not set, all webhooks will be rejected");
        }

        let auth = AuthConfig::from_env();
        if !auth.is_configured() {
            warn!("SUPABASE_JWT_SECRET is not set, authenticated routes will reject all requests");
        }

        let state = Self::from_parts(config, &auth, billing, store, pipeline)?;
        info!(plans = state.plans.plans().len(), "Application state ready");
        Ok(state)
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: ApiConfig,
        auth: &AuthConfig,
        billing: BillingConfig,
        store: SupabaseClient,
        pipeline: FlashcardPipeline,
    ) -> anyhow::Result<Self> {
        let plans = Arc::new(billing.plan_catalog());
        let flashcards = FlashcardSetRepository::new(store.clone());
        let subscription_repo = SubscriptionRepository::new(store.clone());

        let subscriptions = SubscriptionService::new(subscription_repo.clone(), flashcards.clone());
        let webhooks = WebhookProcessor::new(
            WebhookEventRepository::new(store.clone()),
            subscription_repo,
            UserDirectory::new(store.clone()),
            Arc::clone(&plans),
        );

        Ok(Self {
            config,
            auth: Arc::new(JwtVerifier::new(auth)),
            pipeline: Arc::new(pipeline),
            store,
            flashcards,
            subscriptions,
            webhooks,
            billing: Arc::new(LemonSqueezyClient::new(billing)?),
            plans,
        })
    }
}
