//! See [`ChatSession`].

use std::{sync::Arc, time::Duration};

use futures::StreamExt as _;
use parking_lot::Mutex;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use wl_client::{FrameStream, types::ChatRequest};
use wl_conversation::{Conversation, Phase, SealReason};
use wl_sse::Frame;

use crate::{
    assembler::Assembler,
    error::{Error, Result, TransportError},
    transport::Transport,
    update::{Notification, Update},
};

/// How long to wait for the next frame before giving up on a response.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_TITLE: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Ask the server to ground its answer on retrieved documents.
    pub use_rag: bool,

    /// Maximum time between two frames, and before the stream opens.
    pub idle_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            use_rag: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// How a submission ended, if it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server completed the turn.
    Completed { index: usize },

    /// The stream ended before the server completed the turn. The turn holds
    /// whatever text arrived.
    Partial { index: usize },

    /// The user cancelled the turn. The index is `None` if no response had
    /// started yet.
    Cancelled { index: Option<usize> },

    /// The message was not sent. Nothing changed.
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A previous message is still awaiting or receiving its response.
    Busy,

    /// The message is blank.
    EmptyInput,

    /// The conversation has no session to send to.
    NoSession,
}

/// Result of a single step of the pull loop.
enum Step {
    Frame(Frame),
    Failed(wl_client::Error),
    Ended,
    Cancelled,
    TimedOut,
}

/// Sends messages and assembles their streamed responses into a shared
/// [`Conversation`].
///
/// Clones share the conversation and the update channel. Only one response
/// can stream at a time; a submission made while another is in flight is
/// rejected.
pub struct ChatSession<T> {
    transport: Arc<T>,
    conversation: Arc<Mutex<Conversation>>,
    updates: UnboundedSender<Update>,
    options: Options,
}

impl<T> Clone for ChatSession<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            conversation: Arc::clone(&self.conversation),
            updates: self.updates.clone(),
            options: self.options,
        }
    }
}

impl<T: Transport> ChatSession<T> {
    /// Create a session, returning the receiving end of its updates.
    pub fn new(transport: T, conversation: Conversation) -> (Self, UnboundedReceiver<Update>) {
        let (updates, receiver) = mpsc::unbounded_channel();

        let session = Self {
            transport: Arc::new(transport),
            conversation: Arc::new(Mutex::new(conversation)),
            updates,
            options: Options::default(),
        };

        (session, receiver)
    }

    #[must_use]
    pub const fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> Options {
        self.options
    }

    /// The shared conversation. It may be read while a response streams.
    #[must_use]
    pub fn conversation(&self) -> Arc<Mutex<Conversation>> {
        Arc::clone(&self.conversation)
    }

    /// A copy of the conversation as it is right now.
    #[must_use]
    pub fn snapshot(&self) -> Conversation {
        self.conversation.lock().clone()
    }

    /// Send a message and assemble the response.
    ///
    /// Returns once the assistant turn is sealed, or once the message is
    /// rejected. Transport failures and idle timeouts are returned as errors,
    /// after the conversation was brought back to idle and a notification was
    /// sent.
    pub async fn submit(&self, message: &str, cancel: &CancellationToken) -> Result<Outcome> {
        let request = match self.push_user_turn(message)? {
            Ok(request) => request,
            Err(rejection) => {
                debug!(?rejection, "Message rejected.");
                return Ok(Outcome::Rejected(rejection));
            }
        };

        let pending = PendingTurn {
            conversation: Arc::clone(&self.conversation),
            updates: self.updates.clone(),
            armed: true,
        };

        let result = self.respond(&request, cancel).await;
        pending.disarm();

        result
    }

    async fn respond(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<Outcome> {
        let idle_timeout = self.options.idle_timeout;
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = timeout(idle_timeout, self.transport.open(request)) => Some(result),
        };

        let stream = match opened {
            None => {
                self.conversation.lock().abandon()?;
                info!("Cancelled before the response started.");
                return Ok(Outcome::Cancelled { index: None });
            }
            Some(Ok(Ok(stream))) => stream,
            Some(Ok(Err(error))) => return Err(self.abandon(error.into())?),
            Some(Err(_)) => return Err(self.abandon(TransportError::IdleTimeout(idle_timeout))?),
        };

        self.pump(stream, cancel).await
    }

    /// Add the user turn, or explain why it was not added.
    fn push_user_turn(&self, message: &str) -> Result<std::result::Result<ChatRequest, Rejection>> {
        let mut conversation = self.conversation.lock();

        let Some(session_id) = conversation.session_id().cloned() else {
            return Ok(Err(Rejection::NoSession));
        };

        let index = match conversation.submit(message) {
            Ok(index) => index,
            Err(wl_conversation::Error::Busy(_)) => return Ok(Err(Rejection::Busy)),
            Err(wl_conversation::Error::EmptyInput) => return Ok(Err(Rejection::EmptyInput)),
            Err(error) => return Err(error.into()),
        };
        drop(conversation);

        self.emit(Update::TurnSubmitted { index });

        Ok(Ok(ChatRequest {
            session_id,
            message: message.to_owned(),
            use_rag: self.options.use_rag,
        }))
    }

    /// Return to idle after the stream failed to open.
    fn abandon(&self, error: TransportError) -> Result<Error> {
        self.conversation.lock().abandon()?;

        warn!(%error, "Failed to open chat stream.");
        self.notify("Failed to send message");

        Ok(error.into())
    }

    async fn pump(&self, mut stream: FrameStream, cancel: &CancellationToken) -> Result<Outcome> {
        let (mut assembler, update) = Assembler::begin(&mut self.conversation.lock())?;
        self.emit(update);

        let index = assembler.index();
        let idle_timeout = self.options.idle_timeout;

        loop {
            let step = tokio::select! {
                biased;
                () = cancel.cancelled() => Step::Cancelled,
                next = stream.next() => match next {
                    Some(Ok(frame)) => Step::Frame(frame),
                    Some(Err(error)) => Step::Failed(error),
                    None => Step::Ended,
                },
                () = sleep(idle_timeout) => Step::TimedOut,
            };

            if let Step::Frame(frame) = step {
                let update = assembler.apply(&mut self.conversation.lock(), frame);
                if let Some(update) = update {
                    self.emit(update);
                }

                continue;
            }

            // Releases the connection.
            drop(stream);

            if assembler.is_sealed() {
                if let Step::Failed(error) = &step {
                    debug!(index, %error, "Stream failed after the turn was completed.");
                }

                return Ok(Outcome::Completed { index });
            }

            return match step {
                Step::Frame(_) | Step::Ended => {
                    debug!(index, "Stream ended before the turn was completed.");
                    self.finish(&mut assembler, SealReason::Exhausted);
                    Ok(Outcome::Partial { index })
                }
                Step::Cancelled => {
                    info!(index, "Turn cancelled.");
                    self.finish(&mut assembler, SealReason::Cancelled);
                    Ok(Outcome::Cancelled { index: Some(index) })
                }
                Step::TimedOut => {
                    warn!(index, timeout = ?idle_timeout, "No data received, giving up on response.");
                    self.finish(&mut assembler, SealReason::TimedOut);
                    self.notify("The response stopped arriving");
                    Err(TransportError::IdleTimeout(idle_timeout).into())
                }
                Step::Failed(error) => {
                    warn!(index, %error, "Chat stream failed.");
                    self.finish(&mut assembler, SealReason::Failed);
                    self.notify("The response was interrupted");
                    Err(TransportError::Client(error).into())
                }
            };
        }
    }

    fn finish(&self, assembler: &mut Assembler, reason: SealReason) {
        let update = assembler.finish(&mut self.conversation.lock(), reason);
        if let Some(update) = update {
            self.emit(update);
        }
    }

    fn notify(&self, description: &str) {
        self.emit(Update::Notification(Notification::error(ERROR_TITLE, description)));
    }

    fn emit(&self, update: Update) {
        if self.updates.send(update).is_err() {
            trace!("Update receiver dropped, discarding update.");
        }
    }
}

/// Returns the conversation to idle if a submission is dropped before it
/// finishes.
///
/// A turn that already started streaming is sealed as cancelled, keeping its
/// partial text.
struct PendingTurn {
    conversation: Arc<Mutex<Conversation>>,
    updates: UnboundedSender<Update>,
    armed: bool,
}

impl PendingTurn {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut conversation = self.conversation.lock();
        let sealed = match conversation.phase() {
            Phase::Idle => return,
            Phase::Awaiting => conversation.abandon().map(|()| None),
            Phase::Streaming(_) => conversation
                .seal(vec![], SealReason::Cancelled)
                .map(Some),
        };
        drop(conversation);

        match sealed {
            Ok(None) => info!("Submission dropped before the response started."),
            Ok(Some(index)) => {
                info!(index, "Submission dropped, turn cancelled.");

                let update = Update::TurnSealed {
                    index,
                    reason: SealReason::Cancelled,
                    citations: vec![],
                };

                if self.updates.send(update).is_err() {
                    trace!("Update receiver dropped, discarding update.");
                }
            }
            Err(error) => warn!(%error, "Failed to reset conversation after dropped submission."),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
