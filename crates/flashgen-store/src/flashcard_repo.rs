//! Repository for flashcard sets and their cards.

use serde::Serialize;
use tracing::{error, info, warn};

use flashgen_models::{Flashcard, FlashcardRecord, FlashcardSet, FlashcardSetSummary};

use crate::client::SupabaseClient;
use crate::error::{StoreError, StoreResult};
use crate::query::{Order, Query};

const SETS_TABLE: &str = "flashcard_sets";
const CARDS_TABLE: &str = "flashcards";

#[derive(Debug, Serialize)]
struct NewFlashcardSet<'a> {
    user_id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct NewFlashcard<'a> {
    set_id: &'a str,
    question: &'a str,
    answer: &'a str,
}

/// Repository for the `flashcard_sets` and `flashcards` tables.
#[derive(Clone)]
pub struct FlashcardSetRepository {
    client: SupabaseClient,
}

impl FlashcardSetRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Insert a set row.
    pub async fn create_set(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<FlashcardSetSummary> {
        let row = NewFlashcardSet {
            user_id,
            title,
            description,
        };
        let mut rows: Vec<FlashcardSetSummary> = self.client.insert(SETS_TABLE, &row).await?;
        rows.pop()
            .ok_or_else(|| StoreError::InvalidResponse("insert returned no set row".to_string()))
    }

    /// Insert all cards of a set in one request.
    pub async fn insert_cards(&self, set_id: &str, cards: &[Flashcard]) -> StoreResult<Vec<FlashcardRecord>> {
        let rows: Vec<NewFlashcard<'_>> = cards
            .iter()
            .map(|c| NewFlashcard {
                set_id,
                question: &c.question,
                answer: &c.answer,
            })
            .collect();
        self.client.insert(CARDS_TABLE, rows.as_slice()).await
    }

    pub async fn delete_set(&self, set_id: &str) -> StoreResult<()> {
        self.client
            .delete(SETS_TABLE, &Query::new().eq("id", set_id))
            .await
    }

    /// Create a set with its cards.
    ///
    /// If the cards cannot be stored the set row is deleted again and the
    /// card insert error is returned.
    pub async fn save_with_cards(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        cards: &[Flashcard],
    ) -> StoreResult<FlashcardSetSummary> {
        let set = self.create_set(user_id, title, description).await?;

        if let Err(e) = self.insert_cards(&set.id, cards).await {
            error!(set_id = %set.id, error = %e, "Failed to insert flashcards, removing set");
            if let Err(cleanup) = self.delete_set(&set.id).await {
                error!(set_id = %set.id, error = %cleanup, "Failed to remove orphaned set");
            }
            return Err(e);
        }

        info!(set_id = %set.id, cards = cards.len(), "Saved flashcard set");
        Ok(set)
    }

    /// The user's sets, newest first.
    pub async fn list_sets(&self, user_id: &str) -> StoreResult<Vec<FlashcardSetSummary>> {
        let query = Query::new()
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", Order::Desc);
        self.client.select(SETS_TABLE, &query).await
    }

    /// One set, only if owned by `user_id`.
    pub async fn get_set(&self, user_id: &str, set_id: &str) -> StoreResult<Option<FlashcardSetSummary>> {
        let query = Query::new()
            .select("*")
            .eq("id", set_id)
            .eq("user_id", user_id)
            .limit(1);
        let mut rows: Vec<FlashcardSetSummary> = self.client.select(SETS_TABLE, &query).await?;
        Ok(rows.pop())
    }

    /// Cards of a set, oldest first.
    pub async fn cards_for_set(&self, set_id: &str) -> StoreResult<Vec<FlashcardRecord>> {
        let query = Query::new()
            .select("*")
            .eq("set_id", set_id)
            .order("created_at", Order::Asc);
        self.client.select(CARDS_TABLE, &query).await
    }

    /// The user's sets with their cards.
    ///
    /// A failed card fetch leaves that set with no cards.
    pub async fn list_with_cards(&self, user_id: &str) -> StoreResult<Vec<FlashcardSet>> {
        let sets = self.list_sets(user_id).await?;
        let mut result = Vec::with_capacity(sets.len());
        for summary in sets {
            let cards = match self.cards_for_set(&summary.id).await {
                Ok(cards) => cards,
                Err(e) => {
                    warn!(set_id = %summary.id, error = %e, "Failed to load flashcards for set");
                    Vec::new()
                }
            };
            result.push(FlashcardSet::new(summary, cards));
        }
        Ok(result)
    }

    /// One set with cards, only if owned by `user_id`.
    pub async fn get_with_cards(&self, user_id: &str, set_id: &str) -> StoreResult<Option<FlashcardSet>> {
        match self.get_set(user_id, set_id).await? {
            Some(summary) => {
                let cards = self.cards_for_set(&summary.id).await?;
                Ok(Some(FlashcardSet::new(summary, cards)))
            }
            None => Ok(None),
        }
    }

    /// Total cards across all of the user's sets.
    ///
    /// Counted in one request through an inner join on the owning set.
    pub async fn count_cards_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let filter = Query::new()
            .select(&format!("id,{}!inner(user_id)", SETS_TABLE))
            .eq(&format!("{}.user_id", SETS_TABLE), user_id);
        self.client.count(CARDS_TABLE, &filter).await
    }
}
