//! OpenAI clients for speech-to-text and chat completion.
//!
//! Both clients sit behind traits ([`SpeechToText`], [`ChatModel`]) so the
//! generation pipeline can run against fakes in tests.

pub mod chat;
pub mod config;
pub mod error;
mod http;
pub mod transcription;

pub use chat::{ChatModel, ChatPrompt, OpenAiChatClient, EMPTY_COMPLETION};
pub use config::AiConfig;
pub use error::{AiError, AiResult};
pub use transcription::{SpeechToText, WhisperClient};
