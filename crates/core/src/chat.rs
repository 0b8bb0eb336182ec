//! Feedback form and the chat widget.
//!
//! Shoppers can leave feedback or chat from the storefront. Chat messages get
//! an immediate keyword-based bot reply; staff pick conversations up from the
//! back-office.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    ChatMessageId, ChatSender, ContactError, ConversationId, Email, FeedbackId, FeedbackStatus,
    Phone,
};

/// Longest accepted chat message or feedback body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Feedback and chat validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("name is required")]
    MissingName,
    #[error("message is required")]
    EmptyMessage,
    #[error("message is longer than {MAX_MESSAGE_CHARS} characters")]
    MessageTooLong,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error(transparent)]
    InvalidContact(#[from] ContactError),
}

fn check_body(body: &str) -> Result<String, ChatError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::MessageTooLong);
    }
    Ok(body.to_owned())
}

/// A feedback entry from the storefront form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub message: String,
    #[serde(default)]
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    /// Set the triage status. Returns whether it changed.
    pub fn set_status(&mut self, status: FeedbackStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.updated_at = now;
        true
    }
}

/// Feedback form input.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewFeedback {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    pub message: String,
}

impl NewFeedback {
    /// Check the form without building anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChatError`] found.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.name.trim().is_empty() {
            return Err(ChatError::MissingName);
        }
        if self.rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err(ChatError::InvalidRating);
        }
        check_body(&self.message)?;
        Ok(())
    }

    /// Validate and build a new feedback entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChatError`] found.
    pub fn into_feedback(self, now: DateTime<Utc>) -> Result<Feedback, ChatError> {
        self.validate()?;
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Email::parse)
            .transpose()?;
        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Phone::parse)
            .transpose()?;

        Ok(Feedback {
            id: FeedbackId::generate(),
            name: self.name.trim().to_owned(),
            email,
            phone,
            rating: self.rating,
            message: check_body(&self.message)?,
            status: FeedbackStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// One message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub conversation_id: ConversationId,
    pub sender: ChatSender,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a message, trimming and checking the body.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyMessage`] or [`ChatError::MessageTooLong`].
    pub fn new(
        conversation_id: ConversationId,
        sender: ChatSender,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            id: ChatMessageId::generate(),
            conversation_id,
            sender,
            body: check_body(body)?,
            created_at: now,
        })
    }
}

/// Reply used when no topic matches.
pub const FALLBACK_REPLY: &str = "Thanks for your message! A florist will get back to you shortly. \
     For urgent requests please call the shop.";

/// Keyword topics, checked in order. The first topic with a matching word wins.
const TOPICS: &[(&[&str], &str)] = &[
    (
        &["track", "tracking", "status", "where"],
        "You can track your order with its order number (BL-...) and your phone number on the order tracking page.",
    ),
    (
        &["delivery", "deliver", "shipping", "ship", "fee"],
        "We deliver within 50 km of the shop. The fee depends on distance, and orders over the free-shipping threshold ship free.",
    ),
    (
        &["price", "prices", "cost", "much", "cheap", "discount", "sale"],
        "Prices are listed on each product. Items on sale show the discounted price in the cart.",
    ),
    (
        &["open", "opening", "hours", "close", "closing", "time"],
        "The shop is open every day from 8:00 to 20:00.",
    ),
    (
        &["wedding", "event", "events", "bride", "bridal", "party", "decoration"],
        "We love weddings and events! Leave your date and contact details and our event florist will reach out with a proposal.",
    ),
    (
        &["fresh", "care", "water", "wilt", "last", "vase"],
        "Trim the stems at an angle, change the water every two days and keep the flowers away from direct sun.",
    ),
    (
        &["hi", "hello", "hey", "morning", "afternoon", "evening"],
        "Hello! How can we help you today?",
    ),
];

fn words(body: &str) -> Vec<String> {
    body.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// The bot's answer to a customer message.
#[must_use]
pub fn canned_reply(body: &str) -> &'static str {
    let words = words(body);
    TOPICS
        .iter()
        .find(|(keywords, _)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map_or(FALLBACK_REPLY, |(_, reply)| reply)
}

/// One row of the back-office conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub last_message: String,
    pub last_sender: ChatSender,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
    /// The latest message is not from staff.
    pub awaiting_staff: bool,
}

/// Group messages by conversation, most recently active first.
#[must_use]
pub fn summarize(messages: &[ChatMessage]) -> Vec<ConversationSummary> {
    let mut latest: HashMap<&ConversationId, (&ChatMessage, usize)> = HashMap::new();
    for message in messages {
        latest
            .entry(&message.conversation_id)
            .and_modify(|(last, count)| {
                *count += 1;
                if message.created_at >= last.created_at {
                    *last = message;
                }
            })
            .or_insert((message, 1));
    }

    let mut summaries: Vec<ConversationSummary> = latest
        .into_values()
        .map(|(last, count)| ConversationSummary {
            conversation_id: last.conversation_id.clone(),
            last_message: last.body.clone(),
            last_sender: last.sender,
            message_count: count,
            updated_at: last.created_at,
            awaiting_staff: last.sender != ChatSender::Staff,
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.conversation_id.cmp(&b.conversation_id))
    });
    summaries
}

/// Messages of one conversation, oldest first, optionally only those after `since`.
#[must_use]
pub fn conversation(
    messages: Vec<ChatMessage>,
    conversation_id: &ConversationId,
    since: Option<DateTime<Utc>>,
) -> Vec<ChatMessage> {
    let mut thread: Vec<ChatMessage> = messages
        .into_iter()
        .filter(|m| &m.conversation_id == conversation_id)
        .filter(|m| since.is_none_or(|since| m.created_at > since))
        .collect();
    thread.sort_by_key(|m| m.created_at);
    thread
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 8, 10, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn msg(conv: &str, sender: ChatSender, minute: i64) -> ChatMessage {
        ChatMessage::new(ConversationId::new(conv), sender, "hello", at(minute)).unwrap()
    }

    #[test]
    fn test_canned_reply_topics() {
        assert!(canned_reply("How much is the delivery fee?").contains("50 km"));
        assert!(canned_reply("When do you OPEN on Sunday").contains("8:00"));
        assert!(canned_reply("Hi there").starts_with("Hello"));
        // Substantive topics win over greetings.
        assert!(canned_reply("hello, can I track my order").contains("track"));
        assert!(canned_reply("bouquet for my wedding").contains("event florist"));
    }

    #[test]
    fn test_canned_reply_whole_words_only() {
        // "ship" inside "relationship" and "hi" inside "this" must not match.
        assert_eq!(canned_reply("this relationship"), FALLBACK_REPLY);
        assert_eq!(canned_reply(""), FALLBACK_REPLY);
    }

    #[test]
    fn test_feedback_validation() {
        let mut input = NewFeedback {
            name: "Minh".into(),
            email: Some("minh@example.com".into()),
            phone: None,
            rating: Some(5),
            message: "  Beautiful roses!  ".into(),
        };
        let feedback = input.clone().into_feedback(at(0)).unwrap();
        assert_eq!(feedback.message, "Beautiful roses!");
        assert_eq!(feedback.status, FeedbackStatus::New);

        input.rating = Some(6);
        assert_eq!(input.validate(), Err(ChatError::InvalidRating));

        input.rating = None;
        input.message = "   ".into();
        assert_eq!(input.validate(), Err(ChatError::EmptyMessage));
    }

    #[test]
    fn test_message_length_limit() {
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            ChatMessage::new(ConversationId::new("c"), ChatSender::Customer, &long, at(0)),
            Err(ChatError::MessageTooLong)
        );
    }

    #[test]
    fn test_summarize_orders_and_flags() {
        let messages = vec![
            msg("a", ChatSender::Customer, 0),
            msg("a", ChatSender::Bot, 0),
            msg("b", ChatSender::Customer, 5),
            msg("a", ChatSender::Staff, 10),
            msg("b", ChatSender::Bot, 6),
        ];
        let summaries = summarize(&messages);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].conversation_id, ConversationId::new("a"));
        assert_eq!(summaries[0].message_count, 3);
        assert!(!summaries[0].awaiting_staff);
        assert_eq!(summaries[1].last_sender, ChatSender::Bot);
        assert!(summaries[1].awaiting_staff);
    }

    #[test]
    fn test_conversation_since() {
        let messages = vec![
            msg("a", ChatSender::Customer, 2),
            msg("a", ChatSender::Bot, 1),
            msg("b", ChatSender::Customer, 3),
        ];
        let all = conversation(messages.clone(), &ConversationId::new("a"), None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sender, ChatSender::Bot);

        let newer = conversation(messages, &ConversationId::new("a"), Some(at(1)));
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].sender, ChatSender::Customer);
    }
}
