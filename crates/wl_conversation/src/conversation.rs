//! See [`Conversation`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    turn::{Citation, Role, SealReason, Turn},
};

/// Identifier of a chat session, as assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Where the conversation is in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "turn", rename_all = "snake_case")]
pub enum Phase {
    /// Ready to accept a new user turn.
    Idle,

    /// A user turn was submitted, but no response has started streaming.
    Awaiting,

    /// The assistant turn at the given index is open.
    Streaming(usize),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Awaiting => f.write_str("awaiting response"),
            Self::Streaming(index) => write!(f, "streaming turn {index}"),
        }
    }
}

/// An ordered list of turns with at most one open assistant turn.
///
/// The conversation moves through [`Phase::Idle`], [`Phase::Awaiting`] and
/// [`Phase::Streaming`], in that order. New user input is only accepted while
/// idle, so two responses can never write into the same conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConversation")]
pub struct Conversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,

    turns: Vec<Turn>,

    phase: Phase,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session_id: None,
            turns: Vec::new(),
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Seed the conversation with a greeting from the assistant.
    #[must_use]
    pub fn with_greeting(mut self, text: impl Into<String>) -> Self {
        self.turns.push(Turn::greeting(text));
        self
    }

    pub fn set_session_id(&mut self, id: impl Into<SessionId>) {
        self.session_id = Some(id.into());
    }

    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` if a user turn is awaiting or receiving a response.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The currently open assistant turn, if any.
    #[must_use]
    pub fn open_turn(&self) -> Option<&Turn> {
        match self.phase {
            Phase::Streaming(index) => self.turns.get(index),
            Phase::Idle | Phase::Awaiting => None,
        }
    }

    /// Add a user turn.
    ///
    /// Returns the index of the new turn. Fails if the conversation is busy,
    /// or if the message is blank.
    pub fn submit(&mut self, text: impl Into<String>) -> Result<usize> {
        if self.is_busy() {
            debug!(phase = %self.phase, "Rejecting user turn, conversation is busy.");
            return Err(Error::Busy(self.phase));
        }

        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        self.turns.push(Turn::user(text));
        self.phase = Phase::Awaiting;

        let index = self.turns.len() - 1;
        trace!(index, "Submitted user turn.");

        Ok(index)
    }

    /// Open an empty assistant turn for the response to the last user turn.
    pub fn open_assistant(&mut self) -> Result<usize> {
        match self.phase {
            Phase::Awaiting => {}
            Phase::Streaming(_) => return Err(Error::Busy(self.phase)),
            Phase::Idle => return Err(Error::NotAwaiting),
        }

        self.turns.push(Turn::assistant());

        let index = self.turns.len() - 1;
        self.phase = Phase::Streaming(index);
        trace!(index, "Opened assistant turn.");

        Ok(index)
    }

    /// Append text to the open assistant turn.
    pub fn append(&mut self, delta: &str) -> Result<&Turn> {
        let index = self.open_index()?;
        let turn = self.turns.get_mut(index).ok_or(Error::NoOpenTurn)?;
        turn.append(delta)?;

        Ok(turn)
    }

    /// Seal the open assistant turn, returning its index.
    pub fn seal(&mut self, citations: Vec<Citation>, reason: SealReason) -> Result<usize> {
        let index = self.open_index()?;
        self.turns
            .get_mut(index)
            .ok_or(Error::NoOpenTurn)?
            .seal(citations, reason)?;

        self.phase = Phase::Idle;
        debug!(index, %reason, "Sealed assistant turn.");

        Ok(index)
    }

    /// Give up waiting for a response that never started.
    ///
    /// The user turn stays in the conversation.
    pub fn abandon(&mut self) -> Result<()> {
        if self.phase != Phase::Awaiting {
            return Err(Error::NotAwaiting);
        }

        self.phase = Phase::Idle;
        debug!("Abandoned pending response.");

        Ok(())
    }

    fn open_index(&self) -> Result<usize> {
        match self.phase {
            Phase::Streaming(index) => Ok(index),
            Phase::Idle | Phase::Awaiting => Err(Error::NoOpenTurn),
        }
    }
}

/// A conversation as read from a serialized form, before its phase is
/// checked against its turns.
#[derive(Deserialize)]
struct RawConversation {
    #[serde(default)]
    session_id: Option<SessionId>,
    turns: Vec<Turn>,
    phase: Phase,
}

impl TryFrom<RawConversation> for Conversation {
    type Error = Error;

    fn try_from(raw: RawConversation) -> Result<Self> {
        let RawConversation {
            session_id,
            turns,
            phase,
        } = raw;

        let open = turns
            .iter()
            .enumerate()
            .filter(|(_, turn)| turn.is_open())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let last = turns.len().checked_sub(1);
        let consistent = match phase {
            Phase::Idle => open.is_empty(),
            Phase::Awaiting => {
                open.is_empty() && turns.last().is_some_and(|turn| turn.role() == Role::User)
            }
            Phase::Streaming(index) => open == [index] && last == Some(index),
        };

        if !consistent {
            return Err(Error::InconsistentPhase(phase));
        }

        Ok(Self {
            session_id,
            turns,
            phase,
        })
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
