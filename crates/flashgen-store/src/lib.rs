//! Supabase client for flashcard, subscription and webhook storage.
//!
//! Talks to PostgREST (`/rest/v1`) and the auth admin API (`/auth/v1/admin`)
//! with the service role key. Features:
//! - Filter/order query builder
//! - Retries with exponential backoff and jitter
//! - Tracing spans and request metrics
//! - Typed repositories per table

pub mod client;
pub mod error;
pub mod flashcard_repo;
pub mod metrics;
pub mod query;
pub mod retry;
pub mod subscription_repo;
pub mod users;
pub mod webhook_repo;

#[cfg(test)]
mod client_tests;

pub use client::{StoreConfig, SupabaseClient};
pub use error::{StoreError, StoreResult};
pub use flashcard_repo::FlashcardSetRepository;
pub use query::{Order, Query};
pub use retry::RetryConfig;
pub use subscription_repo::SubscriptionRepository;
pub use users::{AuthUserRecord, UserDirectory};
pub use webhook_repo::WebhookEventRepository;
