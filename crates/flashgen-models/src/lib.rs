//! Shared data models for the flashgen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and content sources
//! - Flashcards, flashcard sets and Anki export
//! - Subscription plans and flashcard limits
//! - Payment webhook payloads
//! - YouTube URL parsing

pub mod content;
pub mod flashcard;
pub mod plan;
pub mod subscription;
pub mod utils;
pub mod webhook;

// Re-export common types
pub use content::{ContentError, ContentSource, GenerateRequest, SourceKind, MAX_TEXT_LENGTH};
pub use flashcard::{to_anki_text, Flashcard, FlashcardRecord, FlashcardSet, FlashcardSetSummary};
pub use plan::{
    plan_name_for_variant, FlashcardLimits, Plan, PlanCatalog, PlanTier, FREE_TIER_MAX_FLASHCARDS, PLANS,
};
pub use subscription::{NewUserSubscription, SubscriptionPatch, SubscriptionStatus, UserSubscription};
pub use utils::{canonical_watch_url, extract_youtube_id, YoutubeIdError, YoutubeIdResult};
pub use webhook::{SubscriptionAttributes, WebhookEvent, WebhookEventName};
