//! Message and Conversation domain types.
//!
//! These are the value objects that flow through the whole service:
//! the gateway receives a message → the orchestrator generates a reply →
//! the store appends both to the owning conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::OwnerId;

/// Title every conversation starts with until the first turn renames it.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The generated reply
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "bot" => Ok(Role::Bot),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A single message embedded in a conversation.
///
/// Bot text is the verbatim generated output and may contain markup the
/// client is expected to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a new bot message.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }
}

/// A persisted, owned sequence of message turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID, generated by the orchestrator
    pub id: ConversationId,

    /// The verified user who created it. Never changes.
    pub owner_id: OwnerId,

    /// Placeholder until the first turn, then auto-generated once
    pub title: String,

    /// Creation time, used for most-recent-first listing
    pub created_at: DateTime<Utc>,

    /// Ordered messages, append-only
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation for `owner_id`.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            id: ConversationId::new(),
            owner_id,
            title: PLACEHOLDER_TITLE.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Whether `owner` may read, append to, or delete this conversation.
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        &self.owner_id == owner
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// The listing view of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_is_empty_with_placeholder_title() {
        let conv = Conversation::new(OwnerId::from("u1"));
        assert!(conv.messages.is_empty());
        assert_eq!(conv.title, PLACEHOLDER_TITLE);
        assert!(conv.is_owned_by(&OwnerId::from("u1")));
        assert!(!conv.is_owned_by(&OwnerId::from("u2")));
    }

    #[test]
    fn conversation_ids_are_unique() {
        assert_ne!(ConversationId::new(), ConversationId::new());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::bot("hi")).unwrap();
        assert_eq!(json, r#"{"role":"bot","text":"hi"}"#);
    }

    #[test]
    fn role_parses_from_str() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("bot".parse::<Role>().unwrap(), Role::Bot);
        assert!("assistant".parse::<Role>().is_err());
    }
}
