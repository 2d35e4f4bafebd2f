//! Conversation Store trait — per-user document persistence.
//!
//! The store is addressed by conversation id and supports create, point
//! read, atomic turn append, title overwrite, owner listing and delete.
//! Ownership is enforced by the orchestrator, not by the store.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::identity::OwnerId;
use crate::message::{Conversation, ConversationId, ConversationSummary, Message};

/// The core ConversationStore trait.
///
/// Implementations: SQLite, in-memory (for testing and ephemeral runs).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    /// Persist a freshly created conversation.
    async fn create(&self, conversation: &Conversation) -> std::result::Result<(), StoreError>;

    /// Point read by id.
    async fn get(
        &self,
        id: &ConversationId,
    ) -> std::result::Result<Option<Conversation>, StoreError>;

    /// Append one turn's messages in a single atomic operation.
    ///
    /// Returns the number of messages the conversation held immediately
    /// before the append. Fails with [`StoreError::NotFound`] if the
    /// conversation no longer exists; nothing is written in that case.
    async fn append_turn(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> std::result::Result<usize, StoreError>;

    /// Overwrite the title. Returns `false` if the conversation is gone.
    async fn set_title(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> std::result::Result<bool, StoreError>;

    /// Conversations owned by `owner`, newest first, at most `limit`.
    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> std::result::Result<Vec<ConversationSummary>, StoreError>;

    /// Delete a whole conversation. Returns `false` if it did not exist.
    async fn delete(&self, id: &ConversationId) -> std::result::Result<bool, StoreError>;

    /// Health check — can we reach the backing storage?
    async fn health_check(&self) -> std::result::Result<bool, StoreError> {
        Ok(true)
    }
}
