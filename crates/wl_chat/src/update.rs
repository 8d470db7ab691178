use serde::Serialize;
use wl_conversation::{Citation, SealReason};

/// A change the user interface should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A user turn was added.
    TurnSubmitted { index: usize },

    /// An empty assistant turn was opened.
    TurnOpened { index: usize },

    /// Text was appended to the open turn.
    TurnUpdated {
        index: usize,

        /// The appended text.
        delta: String,

        /// The full text of the turn so far.
        text: String,
    },

    /// The turn was sealed and will no longer change.
    TurnSealed {
        index: usize,
        reason: SealReason,
        citations: Vec<Citation>,
    },

    /// Something the user should be told about.
    Notification(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}
