//! Builders for event-stream bodies, as the chat endpoint would send them.

use serde_json::{Value, json};

/// A single `data:` frame carrying `payload`, followed by a blank line.
#[must_use]
pub fn frame(payload: &Value) -> String {
    format!("data: {payload}\n\n")
}

/// A content frame.
#[must_use]
pub fn content(text: &str) -> String {
    frame(&json!({ "type": "content", "content": text }))
}

/// A done frame carrying `(source, relevance, content)` citations.
#[must_use]
pub fn done(sources: &[(&str, f64, &str)]) -> String {
    let sources = sources
        .iter()
        .map(|(source, relevance, content)| {
            json!({ "source": source, "relevance": relevance, "content": content })
        })
        .collect::<Vec<_>>();

    frame(&json!({ "type": "done", "rag_sources": sources }))
}

/// A done frame without a `rag_sources` field.
#[must_use]
pub fn done_bare() -> String {
    frame(&json!({ "type": "done" }))
}

/// The transport-level end marker.
#[must_use]
pub fn sentinel() -> String {
    "data: [DONE]\n\n".to_owned()
}

/// Concatenate frames into a response body.
#[must_use]
pub fn body<I, S>(frames: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    frames.into_iter().fold(String::new(), |mut body, frame| {
        body.push_str(frame.as_ref());
        body
    })
}
