//! Axum HTTP API server.
//!
//! This crate provides:
//! - Flashcard generation from text and YouTube videos
//! - Flashcard set storage and Anki export
//! - Plans, subscription limits and LemonSqueezy billing
//! - Supabase access token verification
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, AuthConfig, BillingConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
