//! The conversation orchestrator.

use std::sync::Arc;

use parlor_config::AppConfig;
use parlor_core::error::{Error, Result, StoreError};
use parlor_core::identity::OwnerId;
use parlor_core::message::{Conversation, ConversationId, ConversationSummary, Message};
use parlor_core::personality::Personality;
use parlor_core::provider::{GenerationRequest, Provider};
use parlor_core::store::ConversationStore;
use tracing::{debug, info, warn};

use crate::title::{clean_title, title_prompt};

/// Token budget for the title follow-up call.
const TITLE_MAX_TOKENS: u32 = 64;

/// Coordinates the store and the text-generation client for every chat
/// operation. Holds no mutable state; share it through an `Arc`.
pub struct ConversationOrchestrator {
    /// Text-generation client
    provider: Arc<dyn Provider>,

    /// Conversation persistence
    store: Arc<dyn ConversationStore>,

    /// Model passed to every generation request
    model: String,

    /// Sampling temperature
    temperature: f32,

    /// Max output tokens per reply
    max_tokens: Option<u32>,

    /// Cap on the recent-conversations listing
    recent_limit: usize,

    /// Generate a title after the first turn
    auto_title: bool,
}

impl ConversationOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            store,
            model: model.into(),
            temperature,
            max_tokens: None,
            recent_limit: 20,
            auto_title: true,
        }
    }

    /// Build an orchestrator with the provider and chat settings from config.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            provider,
            store,
            config.provider.model.clone(),
            config.provider.temperature,
        )
        .with_max_tokens(config.provider.max_tokens)
        .with_recent_limit(config.chat.recent_limit)
        .with_auto_title(config.chat.auto_title)
    }

    /// Set the max output tokens per reply.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the cap on the recent-conversations listing.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Enable or disable first-turn title generation.
    pub fn with_auto_title(mut self, enabled: bool) -> Self {
        self.auto_title = enabled;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Start an empty conversation with the placeholder title.
    pub async fn create_conversation(&self, owner: &OwnerId) -> Result<ConversationSummary> {
        let conversation = Conversation::new(owner.clone());
        self.store.create(&conversation).await?;

        info!(conversation_id = %conversation.id, owner = %owner, "Conversation created");
        Ok(conversation.summary())
    }

    /// The owner's most recent conversations, newest first.
    pub async fn list_conversations(&self, owner: &OwnerId) -> Result<Vec<ConversationSummary>> {
        let summaries = self.store.list_by_owner(owner, self.recent_limit).await?;
        debug!(owner = %owner, count = summaries.len(), "Listed conversations");
        Ok(summaries)
    }

    /// Fetch a conversation the caller owns.
    pub async fn get_conversation(
        &self,
        owner: &OwnerId,
        id: &ConversationId,
    ) -> Result<Conversation> {
        match self.store.get(id).await? {
            Some(conversation) if conversation.is_owned_by(owner) => Ok(conversation),
            _ => Err(Error::NotFoundOrForbidden),
        }
    }

    /// Run one exchange and return the bot's reply.
    ///
    /// Nothing is persisted unless generation succeeds; then the user and bot
    /// messages are appended together. The first turn of a conversation also
    /// triggers a best-effort title generation.
    pub async fn submit_turn(
        &self,
        owner: &OwnerId,
        id: &ConversationId,
        personality_key: Option<&str>,
        text: &str,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::Validation("Message must not be empty".into()));
        }

        self.get_conversation(owner, id).await?;

        let personality = Personality::resolve(personality_key);
        let request = GenerationRequest::new(&self.model, personality.build_prompt(text))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        debug!(
            conversation_id = %id,
            personality = personality.key(),
            model = %self.model,
            text_len = text.len(),
            "Generating reply"
        );

        let response = self.provider.generate(request).await?;
        let reply = response.text;

        let before = self
            .store
            .append_turn(id, &[Message::user(text), Message::bot(reply.clone())])
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => Error::NotFoundOrForbidden,
                other => Error::Store(other),
            })?;

        info!(
            conversation_id = %id,
            personality = personality.key(),
            reply_len = reply.len(),
            "Turn completed"
        );

        if before == 0 && self.auto_title {
            self.generate_title(id, text).await;
        }

        Ok(reply)
    }

    /// Delete a conversation the caller owns.
    pub async fn delete_conversation(&self, owner: &OwnerId, id: &ConversationId) -> Result<()> {
        self.get_conversation(owner, id).await?;

        if !self.store.delete(id).await? {
            return Err(Error::NotFoundOrForbidden);
        }

        info!(conversation_id = %id, owner = %owner, "Conversation deleted");
        Ok(())
    }

    /// Replace the placeholder title. Failures are logged and swallowed.
    async fn generate_title(&self, id: &ConversationId, user_text: &str) {
        let request = GenerationRequest::new(&self.model, title_prompt(user_text))
            .with_temperature(self.temperature)
            .with_max_tokens(Some(TITLE_MAX_TOKENS));

        let raw = match self.provider.generate(request).await {
            Ok(response) => response.text,
            Err(e) => {
                warn!(conversation_id = %id, "Title generation failed: {e}");
                return;
            }
        };

        let Some(title) = clean_title(&raw) else {
            warn!(conversation_id = %id, "Title generation returned nothing usable");
            return;
        };

        match self.store.set_title(id, &title).await {
            Ok(true) => debug!(conversation_id = %id, title = %title, "Title set"),
            Ok(false) => debug!(conversation_id = %id, "Conversation gone before titling"),
            Err(e) => warn!(conversation_id = %id, "Failed to save title: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::error::ProviderError;
    use parlor_core::message::{PLACEHOLDER_TITLE, Role};
    use parlor_core::provider::GenerationResponse;
    use parlor_store::InMemoryStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a script, then falls back to a fixed reply.
    /// Records every prompt it sees.
    struct ScriptedProvider {
        script: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
        fallback: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<std::result::Result<String, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: "fallback reply".into(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        fn title_calls(&self) -> usize {
            self.prompts()
                .iter()
                .filter(|p| p.starts_with("Write a short title"))
                .count()
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> std::result::Result<GenerationResponse, ProviderError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let next = self.script.lock().unwrap().pop_front();
            let text = next.unwrap_or_else(|| Ok(self.fallback.clone()))?;
            Ok(GenerationResponse {
                text,
                model: request.model,
                usage: None,
            })
        }
    }

    fn setup(
        script: Vec<std::result::Result<String, ProviderError>>,
    ) -> (ConversationOrchestrator, Arc<ScriptedProvider>, Arc<InMemoryStore>) {
        let provider = Arc::new(ScriptedProvider::new(script));
        let store = Arc::new(InMemoryStore::new());
        let orchestrator =
            ConversationOrchestrator::new(provider.clone(), store.clone(), "test-model", 0.7);
        (orchestrator, provider, store)
    }

    fn owner(id: &str) -> OwnerId {
        OwnerId::from(id)
    }

    #[tokio::test]
    async fn create_then_list_shows_placeholder_at_head() {
        let (orch, _, _) = setup(vec![]);
        let u1 = owner("u1");

        let older = orch.create_conversation(&u1).await.unwrap();
        let newer = orch.create_conversation(&u1).await.unwrap();
        assert_eq!(newer.title, PLACEHOLDER_TITLE);

        let list = orch.list_conversations(&u1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[1].id, older.id);
    }

    #[tokio::test]
    async fn list_is_capped() {
        let (orch, _, _) = setup(vec![]);
        let orch = orch.with_recent_limit(3);
        let u1 = owner("u1");
        for _ in 0..5 {
            orch.create_conversation(&u1).await.unwrap();
        }
        assert_eq!(orch.list_conversations(&u1).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn first_turn_appends_two_messages_and_sets_title() {
        let (orch, provider, _) = setup(vec![
            Ok("**Instagram:** Fresh loaves daily!\n**Facebook:** Visit us.".into()),
            Ok("  \"Bakery Promotion Ideas\"  ".into()),
        ]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        let reply = orch
            .submit_turn(&u1, &chat.id, Some("social_media_helper"), "promote my bakery")
            .await
            .unwrap();
        assert!(reply.contains("**Instagram:**"));

        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0], Message::user("promote my bakery"));
        assert_eq!(conv.messages[1].role, Role::Bot);
        assert_eq!(conv.title, "Bakery Promotion Ideas");

        let prompts = provider.prompts();
        assert_eq!(
            prompts[0],
            Personality::SocialMediaHelper.build_prompt("promote my bakery")
        );
        assert_eq!(provider.title_calls(), 1);
    }

    #[tokio::test]
    async fn title_is_generated_only_once() {
        let (orch, provider, _) = setup(vec![
            Ok("reply one".into()),
            Ok("First Title".into()),
            Ok("reply two".into()),
        ]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        orch.submit_turn(&u1, &chat.id, None, "hello").await.unwrap();
        orch.submit_turn(&u1, &chat.id, None, "again").await.unwrap();

        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert_eq!(conv.messages.len(), 4);
        assert_eq!(conv.title, "First Title");
        assert_eq!(provider.title_calls(), 1);
    }

    #[tokio::test]
    async fn prompts_never_replay_history() {
        let (orch, provider, _) = setup(vec![]);
        let orch = orch.with_auto_title(false);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        orch.submit_turn(&u1, &chat.id, Some("study_buddy"), "what is osmosis")
            .await
            .unwrap();
        orch.submit_turn(&u1, &chat.id, Some("study_buddy"), "quiz me")
            .await
            .unwrap();

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1], Personality::StudyBuddy.build_prompt("quiz me"));
        assert!(!prompts[1].contains("osmosis"));
    }

    #[tokio::test]
    async fn unknown_personality_uses_default() {
        let (orch, provider, _) = setup(vec![]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        orch.submit_turn(&u1, &chat.id, Some("pirate_captain"), "teach me knots")
            .await
            .unwrap();

        assert_eq!(
            provider.prompts()[0],
            Personality::default().build_prompt("teach me knots")
        );
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let (orch, provider, _) = setup(vec![Err(ProviderError::Network("timeout".into()))]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        let err = orch
            .submit_turn(&u1, &chat.id, None, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.title, PLACEHOLDER_TITLE);
        assert_eq!(provider.title_calls(), 0);
    }

    #[tokio::test]
    async fn title_failure_still_returns_reply() {
        let (orch, _, _) = setup(vec![
            Ok("here is your plan".into()),
            Err(ProviderError::RateLimited { retry_after_secs: 5 }),
        ]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        let reply = orch
            .submit_turn(&u1, &chat.id, Some("fitness_coach"), "beginner workout")
            .await
            .unwrap();
        assert_eq!(reply, "here is your plan");

        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn blank_title_keeps_placeholder() {
        let (orch, _, _) = setup(vec![Ok("reply".into()), Ok(" \"\" ".into())]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        orch.submit_turn(&u1, &chat.id, None, "hi").await.unwrap();
        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert_eq!(conv.title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_generation() {
        let (orch, provider, _) = setup(vec![]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        let err = orch
            .submit_turn(&u1, &chat.id, None, "   \n\t")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn foreign_and_missing_conversations_are_indistinguishable() {
        let (orch, provider, _) = setup(vec![]);
        let alice = owner("alice");
        let bob = owner("bob");
        let chat = orch.create_conversation(&alice).await.unwrap();
        let missing = ConversationId::new();

        for id in [&chat.id, &missing] {
            assert!(matches!(
                orch.get_conversation(&bob, id).await,
                Err(Error::NotFoundOrForbidden)
            ));
            assert!(matches!(
                orch.submit_turn(&bob, id, None, "hi").await,
                Err(Error::NotFoundOrForbidden)
            ));
            assert!(matches!(
                orch.delete_conversation(&bob, id).await,
                Err(Error::NotFoundOrForbidden)
            ));
        }

        assert!(provider.prompts().is_empty());
        assert!(orch.get_conversation(&alice, &chat.id).await.is_ok());
        assert!(orch.list_conversations(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_conversation() {
        let (orch, _, _) = setup(vec![]);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        orch.delete_conversation(&u1, &chat.id).await.unwrap();
        assert!(matches!(
            orch.get_conversation(&u1, &chat.id).await,
            Err(Error::NotFoundOrForbidden)
        ));
        assert!(orch.list_conversations(&u1).await.unwrap().is_empty());
    }

    /// Deletes the conversation while the reply is being generated.
    struct DeletingProvider {
        store: Arc<InMemoryStore>,
        id: ConversationId,
    }

    #[async_trait::async_trait]
    impl Provider for DeletingProvider {
        fn name(&self) -> &str {
            "deleting"
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> std::result::Result<GenerationResponse, ProviderError> {
            self.store.delete(&self.id).await.unwrap();
            Ok(GenerationResponse {
                text: "too late".into(),
                model: request.model,
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn conversation_deleted_mid_turn_reports_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let u1 = owner("u1");
        let conv = Conversation::new(u1.clone());
        store.create(&conv).await.unwrap();

        let provider = Arc::new(DeletingProvider {
            store: store.clone(),
            id: conv.id.clone(),
        });
        let orch = ConversationOrchestrator::new(provider, store.clone(), "m", 0.7);

        let err = orch.submit_turn(&u1, &conv.id, None, "hi").await.unwrap_err();
        assert!(matches!(err, Error::NotFoundOrForbidden));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_turns_keep_every_message_and_title_once() {
        let (orch, provider, _) = setup(vec![]);
        let orch = Arc::new(orch);
        let u1 = owner("u1");
        let chat = orch.create_conversation(&u1).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..6 {
            let orch = orch.clone();
            let u1 = u1.clone();
            let id = chat.id.clone();
            handles.push(tokio::spawn(async move {
                orch.submit_turn(&u1, &id, None, &format!("message {i}")).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let conv = orch.get_conversation(&u1, &chat.id).await.unwrap();
        assert_eq!(conv.messages.len(), 12);
        for pair in conv.messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Bot);
        }
        assert_eq!(provider.title_calls(), 1);
    }

    #[test]
    fn from_config_reads_chat_settings() {
        let mut config = AppConfig::default();
        config.chat.recent_limit = 7;
        config.chat.auto_title = false;
        let orch = ConversationOrchestrator::from_config(
            Arc::new(ScriptedProvider::new(vec![])),
            Arc::new(InMemoryStore::new()),
            &config,
        );
        assert_eq!(orch.recent_limit, 7);
        assert!(!orch.auto_title);
        assert_eq!(orch.model, config.provider.model);
        assert_eq!(orch.store_name(), "memory");
        assert_eq!(orch.provider_name(), "scripted");
    }
}
