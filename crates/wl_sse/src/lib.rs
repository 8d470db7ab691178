//! Decoding of the chatbot's server-sent event stream.
//!
//! The chat endpoint answers with newline-delimited frames of the form
//! `data: <json>`. [`FrameCodec`] turns the raw response body into [`Frame`]s,
//! keeping any partial line around until the rest of it arrives.

mod codec;
mod error;
mod payload;

pub use codec::{DEFAULT_MAX_LINE_LENGTH, Frame, FrameCodec, MalformedFrame};
pub use error::Error;
pub use payload::{Payload, RagSource};

/// Prefix of every line that carries a payload.
pub const DATA_PREFIX: &str = "data:";

/// Transport-level end-of-stream marker.
///
/// This is distinct from [`Payload::Done`], which ends the logical turn.
pub const SENTINEL: &str = "[DONE]";
