//! Chat API handlers.

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use parlor_core::identity::VerifiedUser;
use parlor_core::message::{Conversation, ConversationId, ConversationSummary, Message};
use parlor_core::personality::Personality;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

/// Routes that require a verified caller. The auth layer is applied by the caller.
pub fn protected_router() -> Router<SharedState> {
    Router::new()
        .route("/api/new-chat", post(new_chat_handler))
        .route("/api/get-recent-chats", get(recent_chats_handler))
        .route("/api/get-chat/{id}", get(get_chat_handler))
        .route("/api/delete-chat/{id}", delete(delete_chat_handler))
        .route("/api/chat", post(chat_handler))
}

/// Routes open to anonymous callers.
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/models", get(models_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Personality key; unknown or absent selects the default.
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatResponse {
    pub chat_id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListItem {
    pub id: String,
    pub title: String,
}

impl From<ConversationSummary> for ChatListItem {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            id: summary.id.0,
            title: summary.title,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetail {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl From<Conversation> for ChatDetail {
    fn from(conv: Conversation) -> Self {
        Self {
            id: conv.id.0,
            title: conv.title,
            created_at: conv.created_at,
            messages: conv.messages,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonalityInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn models_handler() -> Json<Vec<PersonalityInfo>> {
    Json(
        Personality::all()
            .iter()
            .map(|p| PersonalityInfo {
                id: p.key().into(),
                name: p.display_name().into(),
            })
            .collect(),
    )
}

async fn new_chat_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<VerifiedUser>,
) -> Result<Json<NewChatResponse>, ApiError> {
    let summary = state.orchestrator.create_conversation(&user.user_id).await?;
    Ok(Json(NewChatResponse {
        chat_id: summary.id.0,
        title: summary.title,
    }))
}

async fn recent_chats_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<VerifiedUser>,
) -> Result<Json<Vec<ChatListItem>>, ApiError> {
    let summaries = state.orchestrator.list_conversations(&user.user_id).await?;
    Ok(Json(summaries.into_iter().map(ChatListItem::from).collect()))
}

async fn get_chat_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<VerifiedUser>,
    Path(id): Path<String>,
) -> Result<Json<ChatDetail>, ApiError> {
    let conv = state
        .orchestrator
        .get_conversation(&user.user_id, &ConversationId(id))
        .await?;
    Ok(Json(conv.into()))
}

async fn delete_chat_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<VerifiedUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .orchestrator
        .delete_conversation(&user.user_id, &ConversationId(id))
        .await?;
    Ok(Json(DeleteResponse { success: true }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    Extension(user): Extension<VerifiedUser>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        _ => ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())),
    })?;

    let message = req
        .message
        .ok_or_else(|| ApiError::BadRequest("message is required".into()))?;
    let chat_id = req
        .chat_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("chatId is required".into()))?;

    info!(
        conversation_id = %chat_id,
        owner = %user.user_id,
        personality = req.model_id.as_deref().unwrap_or("default"),
        "Chat request"
    );

    let response = state
        .orchestrator
        .submit_turn(
            &user.user_id,
            &ConversationId(chat_id),
            req.model_id.as_deref(),
            &message,
        )
        .await?;

    Ok(Json(ChatResponse { response }))
}
