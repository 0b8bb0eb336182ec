//! Staff side of the chat widget.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use bloom_core::chat::{ChatMessage, ConversationSummary};
use bloom_core::types::ConversationId;
use bloom_store::ChatRepository;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(conversations))
        .route("/conversations/{id}", get(conversation))
        .route("/conversations/{id}/reply", post(reply))
}

/// Conversations, most recently active first.
#[instrument(skip(state))]
pub async fn conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    Ok(Json(ChatRepository::new(state.store()).conversations().await?))
}

/// Every message of one conversation, oldest first.
#[instrument(skip(state))]
pub async fn conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<ChatMessage>>> {
    let messages = ChatRepository::new(state.store()).messages(&id, None).await?;
    if messages.is_empty() {
        return Err(AppError::NotFound(format!("conversation {id}")));
    }
    Ok(Json(messages))
}

#[instrument(skip(state, input))]
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
    Json(input): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let message = ChatRepository::new(state.store())
        .reply(&id, &input.body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
