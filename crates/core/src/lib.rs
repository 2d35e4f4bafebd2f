//! # Parlor Core
//!
//! Domain types, collaborator traits, and error definitions for the Parlor
//! chat service. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates:
//! - [`Provider`] — text generation (`parlor-providers`)
//! - [`ConversationStore`] — persistence (`parlor-store`)
//! - [`IdentityVerifier`] — bearer token verification (`parlor-auth`)
//!
//! The orchestrator in `parlor-chat` depends only on these traits, so tests
//! can swap in fakes without touching the network.

pub mod error;
pub mod identity;
pub mod message;
pub mod personality;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{AuthError, Error, ProviderError, Result, StoreError};
pub use identity::{IdentityVerifier, OwnerId, VerifiedUser};
pub use message::{Conversation, ConversationId, ConversationSummary, Message, Role};
pub use personality::Personality;
pub use provider::{GenerationRequest, GenerationResponse, Provider, Usage};
pub use store::ConversationStore;
