//! See [`Turn`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A retrieved document supporting an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Where the excerpt came from, e.g. a document name.
    pub source: String,

    /// Relevance score, always within `0.0..=1.0`.
    pub relevance: f64,

    /// The cited text.
    pub excerpt: String,
}

impl Citation {
    /// Create a new citation.
    ///
    /// The relevance is clamped into `0.0..=1.0`. A `NaN` relevance is
    /// treated as `0.0`.
    #[must_use]
    pub fn new(source: impl Into<String>, relevance: f64, excerpt: impl Into<String>) -> Self {
        let relevance = if relevance.is_nan() {
            0.0
        } else {
            relevance.clamp(0.0, 1.0)
        };

        Self {
            source: source.into(),
            relevance,
            excerpt: excerpt.into(),
        }
    }

    /// Relevance as a whole percentage.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn relevance_percent(&self) -> u8 {
        (self.relevance * 100.0).round() as u8
    }
}

/// Why a turn stopped accepting content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealReason {
    /// The server signalled the logical end of the turn.
    Completed,

    /// The stream ended before the server signalled the end of the turn.
    Exhausted,

    /// The turn was cancelled by the user.
    Cancelled,

    /// No frame arrived within the idle timeout.
    TimedOut,

    /// The transport failed mid-stream.
    Failed,
}

impl SealReason {
    /// Whether the turn may be missing content.
    #[must_use]
    pub const fn is_partial(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for SealReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Exhausted => "stream ended early",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
            Self::Failed => "failed",
        })
    }
}

/// The lifecycle of a turn's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurnState {
    /// The turn is receiving content.
    Open { text: String },

    /// The turn is final.
    Sealed {
        text: String,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        citations: Vec<Citation>,

        reason: SealReason,
    },
}

/// A single user or assistant message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    created_at: DateTime<Utc>,

    #[serde(flatten)]
    state: TurnState,
}

impl Turn {
    /// A user turn. User turns are sealed on creation.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::sealed(Role::User, text.into())
    }

    /// An empty, open assistant turn.
    #[must_use]
    pub fn assistant() -> Self {
        Self {
            role: Role::Assistant,
            created_at: Utc::now(),
            state: TurnState::Open {
                text: String::new(),
            },
        }
    }

    /// A sealed assistant turn with fixed content, used to greet the user
    /// when a session starts.
    #[must_use]
    pub fn greeting(text: impl Into<String>) -> Self {
        Self::sealed(Role::Assistant, text.into())
    }

    fn sealed(role: Role, text: String) -> Self {
        Self {
            role,
            created_at: Utc::now(),
            state: TurnState::Sealed {
                text,
                citations: vec![],
                reason: SealReason::Completed,
            },
        }
    }

    /// Append a piece of text to an open turn.
    pub fn append(&mut self, delta: &str) -> Result<()> {
        match &mut self.state {
            TurnState::Open { text } => {
                text.push_str(delta);
                Ok(())
            }
            TurnState::Sealed { .. } => Err(Error::Sealed),
        }
    }

    /// Seal an open turn. A sealed turn can no longer change.
    pub fn seal(&mut self, citations: Vec<Citation>, reason: SealReason) -> Result<()> {
        let TurnState::Open { text } = &mut self.state else {
            return Err(Error::Sealed);
        };

        let text = std::mem::take(text);
        self.state = TurnState::Sealed {
            text,
            citations,
            reason,
        };

        Ok(())
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn state(&self) -> &TurnState {
        &self.state
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match &self.state {
            TurnState::Open { text } | TurnState::Sealed { text, .. } => text,
        }
    }

    /// The turn's citations. Always empty while the turn is open.
    #[must_use]
    pub fn citations(&self) -> &[Citation] {
        match &self.state {
            TurnState::Open { .. } => &[],
            TurnState::Sealed { citations, .. } => citations,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, TurnState::Open { .. })
    }

    #[must_use]
    pub const fn seal_reason(&self) -> Option<SealReason> {
        match &self.state {
            TurnState::Open { .. } => None,
            TurnState::Sealed { reason, .. } => Some(*reason),
        }
    }
}

#[cfg(test)]
#[path = "turn_tests.rs"]
mod tests;
