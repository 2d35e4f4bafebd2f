//! In-memory backend — useful for testing and ephemeral runs.

use async_trait::async_trait;
use parlor_core::error::StoreError;
use parlor_core::identity::OwnerId;
use parlor_core::message::{Conversation, ConversationId, ConversationSummary, Message};
use parlor_core::store::ConversationStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store that keeps conversations in a Vec, in creation order.
///
/// Every mutation takes the write lock once, so a turn's messages land
/// together or not at all.
pub struct InMemoryStore {
    conversations: Arc<RwLock<Vec<Conversation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Total number of stored conversations (all owners).
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        if conversations.iter().any(|c| c.id == conversation.id) {
            return Err(StoreError::Storage(format!(
                "Conversation {} already exists",
                conversation.id
            )));
        }
        conversations.push(conversation.clone());
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.iter().find(|c| &c.id == id).cloned())
    }

    async fn append_turn(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> Result<usize, StoreError> {
        let mut conversations = self.conversations.write().await;
        let conv = conversations
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let before = conv.messages.len();
        conv.messages.extend_from_slice(messages);
        Ok(before)
    }

    async fn set_title(&self, id: &ConversationId, title: &str) -> Result<bool, StoreError> {
        let mut conversations = self.conversations.write().await;
        match conversations.iter_mut().find(|c| &c.id == id) {
            Some(conv) => {
                conv.title = title.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self.conversations.read().await;

        // Newest insertion first, then a stable sort keeps that order for equal timestamps.
        let mut results: Vec<ConversationSummary> = conversations
            .iter()
            .rev()
            .filter(|c| c.is_owned_by(owner))
            .map(Conversation::summary)
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit);

        Ok(results)
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let mut conversations = self.conversations.write().await;
        let len_before = conversations.len();
        conversations.retain(|c| &c.id != id);
        Ok(conversations.len() < len_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn conv(owner: &str) -> Conversation {
        Conversation::new(OwnerId::from(owner))
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryStore::new();
        let c = conv("u1");
        store.create(&c).await.unwrap();

        let loaded = store.get(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.owner_id, OwnerId::from("u1"));
        assert!(loaded.messages.is_empty());
        assert!(store.get(&ConversationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_create_rejected() {
        let store = InMemoryStore::new();
        let c = conv("u1");
        store.create(&c).await.unwrap();
        assert!(store.create(&c).await.is_err());
    }

    #[tokio::test]
    async fn append_returns_previous_length() {
        let store = InMemoryStore::new();
        let c = conv("u1");
        store.create(&c).await.unwrap();

        let turn = [Message::user("hi"), Message::bot("hello")];
        assert_eq!(store.append_turn(&c.id, &turn).await.unwrap(), 0);
        assert_eq!(store.append_turn(&c.id, &turn).await.unwrap(), 2);

        let loaded = store.get(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 4);
        assert_eq!(loaded.messages[3], Message::bot("hello"));
    }

    #[tokio::test]
    async fn append_to_missing_conversation_fails() {
        let store = InMemoryStore::new();
        let err = store
            .append_turn(&ConversationId::new(), &[Message::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_owner_scoped_newest_first_and_capped() {
        let store = InMemoryStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let mut c = conv("u1");
            c.created_at = base + Duration::seconds(i);
            c.title = format!("chat {i}");
            store.create(&c).await.unwrap();
        }
        store.create(&conv("u2")).await.unwrap();

        let list = store.list_by_owner(&OwnerId::from("u1"), 3).await.unwrap();
        let titles: Vec<_> = list.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["chat 4", "chat 3", "chat 2"]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut first = conv("u1");
        first.created_at = now;
        let mut second = conv("u1");
        second.created_at = now;
        store.create(&first).await.unwrap();
        store.create(&second).await.unwrap();

        let list = store.list_by_owner(&OwnerId::from("u1"), 20).await.unwrap();
        assert_eq!(list[0].id, second.id);
    }

    #[tokio::test]
    async fn set_title_and_delete() {
        let store = InMemoryStore::new();
        let c = conv("u1");
        store.create(&c).await.unwrap();

        assert!(store.set_title(&c.id, "Bakery promo").await.unwrap());
        assert_eq!(store.get(&c.id).await.unwrap().unwrap().title, "Bakery promo");

        assert!(store.delete(&c.id).await.unwrap());
        assert!(!store.delete(&c.id).await.unwrap());
        assert!(!store.set_title(&c.id, "gone").await.unwrap());
        assert!(store.is_empty().await);
    }
}
