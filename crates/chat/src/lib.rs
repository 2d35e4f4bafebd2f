//! Conversation orchestration for Parlor.
//!
//! The [`ConversationOrchestrator`] sequences ownership checks, prompt
//! construction, text generation, persistence and first-turn titling.

pub mod orchestrator;
pub mod title;

pub use orchestrator::ConversationOrchestrator;
pub use title::{clean_title, title_prompt};
