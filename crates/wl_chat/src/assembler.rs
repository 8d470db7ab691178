//! See [`Assembler`].

use tracing::{debug, trace, warn};
use wl_conversation::{Citation, Conversation, SealReason};
use wl_sse::{Frame, Payload, RagSource};

use crate::{error::Result, update::Update};

/// Applies the frames of one response to a conversation.
///
/// The assembler owns exactly one assistant turn, opened by [`begin`] and
/// sealed either by a `done` frame or by [`finish`]. Once the turn is sealed,
/// any further frames are ignored.
///
/// [`begin`]: Self::begin
/// [`finish`]: Self::finish
#[derive(Debug)]
pub struct Assembler {
    index: usize,
    sealed: bool,
}

impl Assembler {
    /// Open an assistant turn for the pending user turn.
    pub fn begin(conversation: &mut Conversation) -> Result<(Self, Update)> {
        let index = conversation.open_assistant()?;

        Ok((Self { index, sealed: false }, Update::TurnOpened { index }))
    }

    /// Index of the assistant turn this assembler writes to.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Apply a single frame, returning the resulting update, if any.
    pub fn apply(&mut self, conversation: &mut Conversation, frame: Frame) -> Option<Update> {
        if self.sealed {
            debug!(index = self.index, "Ignoring frame received after the turn was sealed.");
            return None;
        }

        let payload = match frame {
            Frame::Payload(payload) => payload,
            Frame::Malformed(frame) => {
                warn!(index = self.index, %frame, "Skipping malformed frame.");
                return None;
            }
        };

        trace!(index = self.index, kind = payload.kind(), "Applying frame.");

        match payload {
            Payload::Content { content } if content.is_empty() => None,
            Payload::Content { content } => {
                let text = match conversation.append(&content) {
                    Ok(turn) => turn.text().to_owned(),
                    Err(error) => {
                        warn!(index = self.index, %error, "Failed to append to turn.");
                        return None;
                    }
                };

                Some(Update::TurnUpdated {
                    index: self.index,
                    delta: content,
                    text,
                })
            }
            Payload::Done { rag_sources } => {
                let citations = rag_sources.into_iter().map(into_citation).collect();
                self.seal(conversation, citations, SealReason::Completed)
            }
            Payload::Unknown => {
                debug!(index = self.index, "Ignoring frame of unknown type.");
                None
            }
        }
    }

    /// Seal the turn for a reason other than a `done` frame.
    ///
    /// Does nothing if the turn is already sealed.
    pub fn finish(&mut self, conversation: &mut Conversation, reason: SealReason) -> Option<Update> {
        if self.sealed {
            return None;
        }

        self.seal(conversation, vec![], reason)
    }

    fn seal(
        &mut self,
        conversation: &mut Conversation,
        citations: Vec<Citation>,
        reason: SealReason,
    ) -> Option<Update> {
        self.sealed = true;

        if let Err(error) = conversation.seal(citations.clone(), reason) {
            warn!(index = self.index, %error, "Failed to seal turn.");
            return None;
        }

        Some(Update::TurnSealed {
            index: self.index,
            reason,
            citations,
        })
    }
}

fn into_citation(source: RagSource) -> Citation {
    Citation::new(source.source, source.relevance, source.content)
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
