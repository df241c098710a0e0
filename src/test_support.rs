// Test support utilities for both unit and integration tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::Deck;
use crate::store::{DeckStore, StoreError};

/// One record written to a [`MemoryDeckStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenDeck {
    pub name: String,
    pub deck: Deck,
    pub archived: bool,
    pub tags: Vec<String>,
}

/// Mock deck store for testing.
///
/// Keeps written records in memory instead of a database, in write order,
/// so tests can assert on exactly what the orchestrator did.
#[derive(Default)]
pub struct MemoryDeckStore {
    records: Mutex<Vec<WrittenDeck>>,
}

impl MemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a record, e.g. a leftover from a previous run.
    pub fn seed(&self, name: &str, deck: Deck, tags: &[&str]) {
        self.records.lock().unwrap().push(WrittenDeck {
            name: name.to_string(),
            deck,
            archived: false,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
    }

    /// Every record currently stored, in write order.
    pub fn written(&self) -> Vec<WrittenDeck> {
        self.records.lock().unwrap().clone()
    }

    /// Number of stored records carrying `tag`.
    pub fn count_with_tag(&self, tag: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.tags.iter().any(|t| t == tag))
            .count()
    }
}

#[async_trait]
impl DeckStore for MemoryDeckStore {
    async fn add_deck(
        &self,
        name: &str,
        deck: &Deck,
        archive: bool,
        category_tag: &str,
        origin_tag: &str,
    ) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(WrittenDeck {
            name: name.to_string(),
            deck: deck.clone(),
            archived: archive,
            tags: vec![category_tag.to_string(), origin_tag.to_string()],
        });
        Ok(())
    }

    async fn delete_all_with_tag(&self, tag: &str) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| !record.tags.iter().any(|t| t == tag));
        Ok((before - records.len()) as u64)
    }
}
