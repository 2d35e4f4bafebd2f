//! SQLite conversation store.
//!
//! Uses a single SQLite database file with two tables:
//! - `conversations` — one row per conversation, with a running `message_count`
//! - `messages` — one row per message, keyed by `(conversation_id, position)`
//!
//! A turn is appended inside one transaction whose first statement bumps
//! `message_count`. That write takes SQLite's reserved lock up front, so
//! concurrent turns on the same conversation serialize instead of racing on
//! positions.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parlor_core::error::StoreError;
use parlor_core::identity::OwnerId;
use parlor_core::message::{Conversation, ConversationId, ConversationSummary, Message, Role};
use parlor_core::store::ConversationStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed conversation store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a connection URL.
    ///
    /// The database and all tables/indexes are created automatically.
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // Each connection to `:memory:` is its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite conversation store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations — creates tables and indexes.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                iid           INTEGER PRIMARY KEY AUTOINCREMENT,
                id            TEXT UNIQUE NOT NULL,
                owner_id      TEXT NOT NULL,
                title         TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                message_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                position        INTEGER NOT NULL,
                role            TEXT NOT NULL,
                text            TEXT NOT NULL,
                PRIMARY KEY (conversation_id, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_owner_created \
             ON conversations(owner_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("owner index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Fixed-width UTC timestamps sort lexicographically in time order.
    fn encode_time(time: &chrono::DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn decode_time(raw: &str) -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationSummary, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        Ok(ConversationSummary {
            id: ConversationId(id),
            title,
            created_at: Self::decode_time(&created_at),
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let text: String = row
            .try_get("text")
            .map_err(|e| StoreError::QueryFailed(format!("text column: {e}")))?;
        let role = Role::from_str(&role).map_err(StoreError::QueryFailed)?;

        Ok(Message { role, text })
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, owner_id, title, created_at, message_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(conversation.id.as_str())
        .bind(conversation.owner_id.as_str())
        .bind(&conversation.title)
        .bind(Self::encode_time(&conversation.created_at))
        .bind(conversation.messages.len() as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT conversation failed: {e}")))?;

        for (position, message) in conversation.messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO messages (conversation_id, position, role, text) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(conversation.id.as_str())
            .bind(position as i64)
            .bind(message.role.as_str())
            .bind(&message.text)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT message failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(conversation_id = %conversation.id, "Created conversation");
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, owner_id, title, created_at FROM conversations WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT conversation: {e}")))?
        else {
            return Ok(None);
        };

        let summary = Self::row_to_summary(&row)?;
        let owner_id: String = row
            .try_get("owner_id")
            .map_err(|e| StoreError::QueryFailed(format!("owner_id column: {e}")))?;

        let rows = sqlx::query(
            "SELECT role, text FROM messages WHERE conversation_id = ?1 ORDER BY position",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT messages: {e}")))?;

        let messages = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Conversation {
            id: summary.id,
            owner_id: OwnerId(owner_id),
            title: summary.title,
            created_at: summary.created_at,
            messages,
        }))
    }

    async fn append_turn(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let count = messages.len() as i64;
        let row = sqlx::query(
            "UPDATE conversations SET message_count = message_count + ?1 WHERE id = ?2 \
             RETURNING message_count",
        )
        .bind(count)
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE message_count failed: {e}")))?;

        // Dropping `tx` rolls back.
        let Some(row) = row else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let new_count: i64 = row
            .try_get("message_count")
            .map_err(|e| StoreError::QueryFailed(format!("message_count column: {e}")))?;
        let before = new_count - count;

        for (offset, message) in messages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO messages (conversation_id, position, role, text) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id.as_str())
            .bind(before + offset as i64)
            .bind(message.role.as_str())
            .bind(&message.text)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT message failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(conversation_id = %id, before, appended = count, "Appended turn");
        Ok(before as usize)
    }

    async fn set_title(&self, id: &ConversationId, title: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE conversations SET title = ?1 WHERE id = ?2")
            .bind(title)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("UPDATE title failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, created_at FROM conversations
            WHERE owner_id = ?1
            ORDER BY created_at DESC, iid DESC
            LIMIT ?2
            "#,
        )
        .bind(owner.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("List by owner: {e}")))?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Health check failed: {e}")))?;
        Ok(true)
    }
}
