//! Request handlers.

pub mod billing;
pub mod flashcards;
pub mod generate;
pub mod health;
pub mod plans;
pub mod subscription;

pub use health::*;
