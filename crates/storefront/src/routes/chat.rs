//! Chat widget endpoints.
//!
//! Each customer message gets an immediate canned reply from the bot;
//! staff answers arrive later and are picked up by polling.
//!
//! A session only ever reads and writes its own conversation. A
//! `conversation_id` sent by the client is honored only when it matches the
//! one stored in the session.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use bloom_core::chat::ChatMessage;
use bloom_core::types::ConversationId;
use bloom_store::ChatRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::session::{conversation_id, set_conversation_id};
use crate::state::AppState;

/// New message from the widget.
#[derive(Debug, Deserialize)]
pub struct PostMessage {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    pub body: String,
}

/// Messages in one conversation.
#[derive(Debug, Serialize)]
pub struct ConversationMessages {
    pub conversation_id: Option<ConversationId>,
    pub messages: Vec<ChatMessage>,
}

/// Polling query.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

/// The session's conversation. A requested id belonging to another
/// conversation is ignored.
async fn session_conversation(
    session: &Session,
    requested: Option<&ConversationId>,
) -> Result<Option<ConversationId>> {
    let own = conversation_id(session).await?;
    if let Some(requested) = requested
        && own.as_ref() != Some(requested)
    {
        tracing::warn!(conversation_id = %requested, "Ignoring conversation not owned by session");
    }
    Ok(own)
}

/// Post a customer message; answers with it and the bot's reply.
#[instrument(skip(state, session, request))]
pub async fn post_message(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PostMessage>,
) -> Result<(StatusCode, Json<ConversationMessages>)> {
    let conversation = session_conversation(&session, request.conversation_id.as_ref()).await?;

    let (message, reply) = ChatRepository::new(state.store())
        .post_customer_message(conversation, &request.body, Utc::now())
        .await?;
    set_conversation_id(&session, &message.conversation_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationMessages {
            conversation_id: Some(message.conversation_id.clone()),
            messages: vec![message, reply],
        }),
    ))
}

/// Poll the session's conversation, optionally only for messages after
/// `since`. A session that never chatted gets an empty list.
#[instrument(skip(state, session))]
pub async fn messages(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PollQuery>,
) -> Result<Json<ConversationMessages>> {
    let conversation = session_conversation(&session, query.conversation_id.as_ref()).await?;
    let Some(conversation) = conversation else {
        return Ok(Json(ConversationMessages {
            conversation_id: None,
            messages: Vec::new(),
        }));
    };

    let messages = ChatRepository::new(state.store())
        .messages(&conversation, query.since)
        .await?;
    Ok(Json(ConversationMessages {
        conversation_id: Some(conversation),
        messages,
    }))
}
