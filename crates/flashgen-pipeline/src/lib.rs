//! Flashcard generation pipeline.
//!
//! Turns raw text or a YouTube video into flashcards:
//! video audio is downloaded, transcribed, sent to a chat model with the
//! flashcard prompt, and the reply is parsed into question/answer cards.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod prompt;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::PipelineLogger;
pub use parser::parse_flashcards;
pub use pipeline::{FlashcardPipeline, GeneratedDeck, VideoInfo};
pub use prompt::{build_user_prompt, SYSTEM_PROMPT};
