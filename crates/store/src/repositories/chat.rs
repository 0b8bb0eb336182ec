//! Chat widget conversations.

use chrono::{DateTime, Utc};

use bloom_core::chat::{ChatMessage, ConversationSummary, canned_reply, conversation, summarize};
use bloom_core::types::{ChatSender, ConversationId};

use crate::error::RepositoryError;
use crate::store::Store;

/// Repository for chat messages.
pub struct ChatRepository<'a> {
    store: &'a Store,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Store a customer message and the bot's reply.
    ///
    /// Starts a new conversation when `conversation_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for an empty or oversized body.
    pub async fn post_customer_message(
        &self,
        conversation_id: Option<ConversationId>,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<(ChatMessage, ChatMessage), RepositoryError> {
        let conversation_id = conversation_id.unwrap_or_else(ConversationId::generate);
        let message = ChatMessage::new(conversation_id.clone(), ChatSender::Customer, body, now)
            .map_err(RepositoryError::validation)?;
        let reply = ChatMessage::new(conversation_id, ChatSender::Bot, canned_reply(body), now)
            .map_err(RepositoryError::validation)?;

        let message = self.store.insert(message).await?;
        let reply = self.store.insert(reply).await?;
        tracing::debug!(conversation_id = %message.conversation_id, "Chat message received");
        Ok((message, reply))
    }

    /// Messages of a conversation, oldest first, optionally only newer than `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn messages(
        &self,
        conversation_id: &ConversationId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(conversation(
            self.store.all().await?,
            conversation_id,
            since,
        ))
    }

    /// All conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        Ok(summarize(&self.store.all::<ChatMessage>().await?))
    }

    /// Post a staff reply into an existing conversation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the conversation has no
    /// messages, or `RepositoryError::Validation` for a bad body.
    pub async fn reply(
        &self,
        conversation_id: &ConversationId,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError> {
        let exists = self
            .store
            .all::<ChatMessage>()
            .await?
            .iter()
            .any(|m| &m.conversation_id == conversation_id);
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        let message = ChatMessage::new(conversation_id.clone(), ChatSender::Staff, body, now)
            .map_err(RepositoryError::validation)?;
        let message = self.store.insert(message).await?;
        tracing::info!(conversation_id = %conversation_id, "Staff reply posted");
        Ok(message)
    }
}
