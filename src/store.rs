use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::Deck;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The external deck repository seam.
///
/// The import orchestrator is the only writer and serializes its writes, so
/// implementations don't need their own locking discipline around the two
/// calls interleaving.
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// Write one deck under the display name `name`, carrying both tags.
    /// `archive` marks the record archived as it is written.
    async fn add_deck(
        &self,
        name: &str,
        deck: &Deck,
        archive: bool,
        category_tag: &str,
        origin_tag: &str,
    ) -> Result<(), StoreError>;

    /// Delete every record carrying `tag`. Returns the number deleted.
    async fn delete_all_with_tag(&self, tag: &str) -> Result<u64, StoreError>;
}

/// A stored deck row with its tags, as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct DbDeck {
    pub id: String,
    pub name: String,
    pub class: String,
    pub cards: Vec<String>,
    pub source_url: String,
    pub archived: bool,
    pub tags: Vec<String>,
}

/// SQLite-backed deck store.
#[derive(Debug, Clone)]
pub struct SqliteDeckStore {
    pool: SqlitePool,
}

impl SqliteDeckStore {
    /// Open the database (creating it if missing) and ensure tables exist.
    pub async fn new(database_path: &str) -> Result<Self, StoreError> {
        // Use sqlite:// with ?mode=rwc to create if it doesn't exist
        let database_url = format!("sqlite://{}?mode=rwc", database_path);
        info!("Connecting to {}", database_url);
        let pool = SqlitePool::connect(&database_url).await?;

        let store = SqliteDeckStore { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                class TEXT NOT NULL,
                cards TEXT NOT NULL,
                source_url TEXT NOT NULL,
                archived BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deck_tags (
                deck_id TEXT NOT NULL,
                tag TEXT NOT NULL,
                FOREIGN KEY (deck_id) REFERENCES decks (id) ON DELETE CASCADE,
                UNIQUE(deck_id, tag)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of deck rows currently stored, any tag.
    pub async fn deck_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM decks")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count as u64)
    }

    /// Every stored deck carrying `tag`, with all of its tags attached.
    pub async fn decks_with_tag(&self, tag: &str) -> Result<Vec<DbDeck>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.class, d.cards, d.source_url, d.archived
            FROM decks d
            JOIN deck_tags t ON t.deck_id = d.id
            WHERE t.tag = ?
            ORDER BY d.name
            "#,
        )
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;

        let mut decks = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let cards_json: String = row.get("cards");

            let tag_rows = sqlx::query("SELECT tag FROM deck_tags WHERE deck_id = ? ORDER BY tag")
                .bind(&id)
                .fetch_all(&self.pool)
                .await?;

            decks.push(DbDeck {
                id,
                name: row.get("name"),
                class: row.get("class"),
                cards: serde_json::from_str(&cards_json)?,
                source_url: row.get("source_url"),
                archived: row.get("archived"),
                tags: tag_rows.iter().map(|r| r.get("tag")).collect(),
            });
        }

        Ok(decks)
    }
}

#[async_trait]
impl DeckStore for SqliteDeckStore {
    async fn add_deck(
        &self,
        name: &str,
        deck: &Deck,
        archive: bool,
        category_tag: &str,
        origin_tag: &str,
    ) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        let cards = serde_json::to_string(&deck.cards)?;
        let created_at = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO decks (id, name, class, cards, source_url, archived, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(&deck.class)
        .bind(&cards)
        .bind(&deck.source_url)
        .bind(archive)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        for tag in [category_tag, origin_tag] {
            sqlx::query("INSERT INTO deck_tags (deck_id, tag) VALUES (?, ?)")
                .bind(&id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_all_with_tag(&self, tag: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Collect ids first, then delete rows and tag links explicitly:
        // SQLite only honors ON DELETE CASCADE when foreign keys are
        // enabled per connection.
        let rows = sqlx::query("SELECT deck_id FROM deck_tags WHERE tag = ?")
            .bind(tag)
            .fetch_all(&mut *tx)
            .await?;
        let ids: Vec<String> = rows.iter().map(|row| row.get("deck_id")).collect();

        for id in &ids {
            sqlx::query("DELETE FROM deck_tags WHERE deck_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM decks WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }
}
