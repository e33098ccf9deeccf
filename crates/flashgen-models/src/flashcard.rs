//! Flashcards, flashcard sets and Anki export.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Format as a single Anki import line (`question|answer`).
    ///
    /// Newlines inside either side would split the card on import, so they
    /// are folded into spaces.
    pub fn to_anki_line(&self) -> String {
        format!("{}|{}", fold_newlines(&self.question), fold_newlines(&self.answer))
    }
}

/// Stored flashcard row (`flashcards` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlashcardRecord {
    pub id: String,
    pub set_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&FlashcardRecord> for Flashcard {
    fn from(record: &FlashcardRecord) -> Self {
        Flashcard::new(record.question.clone(), record.answer.clone())
    }
}

/// Stored flashcard set row (`flashcard_sets` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlashcardSetSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A flashcard set with its cards, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlashcardSet {
    #[serde(flatten)]
    pub summary: FlashcardSetSummary,
    pub card_count: usize,
    pub flashcards: Vec<FlashcardRecord>,
}

impl FlashcardSet {
    pub fn new(summary: FlashcardSetSummary, flashcards: Vec<FlashcardRecord>) -> Self {
        Self {
            summary,
            card_count: flashcards.len(),
            flashcards,
        }
    }

    /// Cards without storage metadata.
    pub fn cards(&self) -> Vec<Flashcard> {
        self.flashcards.iter().map(Flashcard::from).collect()
    }
}

/// Render cards as an Anki plain-text import (one `question|answer` per line).
pub fn to_anki_text(cards: &[Flashcard]) -> String {
    cards
        .iter()
        .map(Flashcard::to_anki_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn fold_newlines(s: &str) -> String {
    s.split(['\r', '\n'])
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}
