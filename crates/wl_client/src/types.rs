//! Request and response bodies of the chatbot API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wl_conversation::SessionId;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSession {
    pub session_type: String,
    pub user_id: String,
}

/// A freshly created chat session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub session_id: SessionId,

    /// Any additional fields the server returns.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the streaming chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub session_id: SessionId,
    pub message: String,
    pub use_rag: bool,
}

/// A message as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The stored messages of a session.
///
/// The server either answers with a bare list of messages, or wraps them in
/// an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum History {
    Wrapped {
        #[serde(default)]
        session_id: Option<SessionId>,
        messages: Vec<HistoryMessage>,
    },
    Bare(Vec<HistoryMessage>),
}

impl History {
    #[must_use]
    pub fn messages(&self) -> &[HistoryMessage] {
        match self {
            Self::Wrapped { messages, .. } | Self::Bare(messages) => messages,
        }
    }
}

/// A rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Rating sent for a thumbs-up.
    pub const UP: Self = Self(5);

    /// Rating sent for a thumbs-down.
    pub const DOWN: Self = Self(1);

    pub fn new(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::Rating(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub session_id: SessionId,
    pub rating: Rating,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
}
