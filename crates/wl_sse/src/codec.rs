use std::fmt;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::{
    DATA_PREFIX, SENTINEL,
    error::{Error, Result},
    payload::Payload,
};

/// Default upper bound for a single line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// A decoded frame of the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A well-formed payload.
    Payload(Payload),

    /// A `data:` line whose payload could not be decoded.
    ///
    /// This is yielded as an item rather than an error, so that a single bad
    /// frame does not end the stream.
    Malformed(MalformedFrame),
}

impl From<Payload> for Frame {
    fn from(payload: Payload) -> Self {
        Self::Payload(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedFrame {
    /// The raw payload, after the `data:` prefix was stripped.
    pub data: String,

    /// Why decoding failed.
    pub error: String,
}

impl MalformedFrame {
    /// Characters of the payload shown when the frame is displayed.
    pub const DISPLAY_LIMIT: usize = 200;
}

impl fmt::Display for MalformedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((end, _)) = self.data.char_indices().nth(Self::DISPLAY_LIMIT) else {
            return write!(f, "{} (payload: {:?})", self.error, self.data);
        };

        write!(
            f,
            "{} (payload: {:?}..., {} bytes)",
            self.error,
            &self.data[..end],
            self.data.len()
        )
    }
}

/// Splits a byte stream into lines and decodes the `data:` lines into
/// [`Frame`]s.
///
/// Bytes are split on `\n` before they are decoded as UTF-8, so a chunk
/// boundary in the middle of a line, or even in the middle of a multi-byte
/// character, is harmless. Whatever follows the last newline stays in the
/// read buffer until the next chunk arrives.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Offset into the read buffer up to which we already know there is no
    /// newline.
    next_index: usize,

    /// Maximum length of a single line.
    max_length: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_index: 0,
            max_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Set the maximum length of a single line, in bytes.
    #[must_use]
    pub const fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Decode a single line, without its terminating newline.
    ///
    /// Returns `None` for lines that carry no payload.
    fn decode_line(line: &[u8]) -> Option<Frame> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let data = line.strip_prefix(DATA_PREFIX.as_bytes())?;

        let data = match std::str::from_utf8(data) {
            Ok(data) => data.trim(),
            Err(error) => {
                return Some(Frame::Malformed(MalformedFrame {
                    data: String::from_utf8_lossy(data).trim().to_owned(),
                    error: error.to_string(),
                }));
            }
        };

        if data.is_empty() {
            trace!("Empty data line, skipping.");
            return None;
        }

        if data == SENTINEL {
            trace!("Stream sentinel received.");
            return None;
        }

        Some(match serde_json::from_str::<Payload>(data) {
            Ok(payload) => Frame::Payload(payload),
            Err(error) => Frame::Malformed(MalformedFrame {
                data: data.to_owned(),
                error: error.to_string(),
            }),
        })
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            let Some(offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
                if buf.len() > self.max_length {
                    return Err(Error::LineTooLong {
                        max: self.max_length,
                    });
                }

                // Everything up to here is part of an incomplete line.
                self.next_index = buf.len();
                return Ok(None);
            };

            let end = self.next_index + offset;
            self.next_index = 0;

            if end > self.max_length {
                return Err(Error::LineTooLong {
                    max: self.max_length,
                });
            }

            let line = buf.split_to(end + 1);
            if let Some(frame) = Self::decode_line(&line[..end]) {
                return Ok(Some(frame));
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        if buf.is_empty() {
            return Ok(None);
        }

        // The stream ended without a trailing newline.
        self.next_index = 0;
        let line = buf.split_to(buf.len());
        trace!(len = line.len(), "Decoding unterminated final line.");

        Ok(Self::decode_line(&line))
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
