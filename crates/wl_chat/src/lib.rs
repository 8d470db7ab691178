//! Assembles streamed chat answers into conversation turns.
//!
//! [`Assembler`] is the synchronous core: it applies decoded frames to a
//! [`Conversation`](wl_conversation::Conversation) and reports what changed.
//! [`ChatSession`] drives it over a live [`Transport`], adding rejection of
//! concurrent submissions, cancellation and an idle timeout.

mod assembler;
mod error;
mod session;
mod transport;
mod update;

pub use assembler::Assembler;
pub use error::{Error, TransportError};
pub use session::{ChatSession, DEFAULT_IDLE_TIMEOUT, Options, Outcome, Rejection};
pub use transport::Transport;
pub use update::{Notification, Severity, Update};
