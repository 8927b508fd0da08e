//! Conversation and message records.
//!
//! Messages are immutable once appended; a conversation only ever grows
//! its transcript or changes its default model. Both live for the session
//! only — there is no persistence layer.

use chrono::Utc;

use crate::core::ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Sender::User
    }

    pub fn is_assistant(self) -> bool {
        self == Sender::Assistant
    }
}

impl TryFrom<&str> for Sender {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            _ => Err(format!("invalid sender: {value}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Model the message was produced with (assistant) or the model in
    /// effect when it was typed (user). `None` before any model is known.
    pub model_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, model_id: Option<String>) -> Self {
        Self {
            id: ids::next_id(),
            text: text.into(),
            sender,
            model_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(text: impl Into<String>, model_id: Option<String>) -> Self {
        Self::new(Sender::User, text, model_id)
    }

    pub fn assistant(text: impl Into<String>, model_id: Option<String>) -> Self {
        Self::new(Sender::Assistant, text, model_id)
    }
}

/// A titled, ordered transcript with an associated default model.
///
/// Insertion order is display order; the store guarantees ids are unique
/// for the conversation's lifetime.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub model_id: Option<String>,
    messages: Vec<Message>,
    pub created_at: i64,
}

impl Conversation {
    pub fn new(id: String, title: impl Into<String>, model_id: Option<String>) -> Self {
        Self {
            id,
            title: title.into(),
            model_id,
            messages: Vec::new(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
