use serde::{Deserialize, Serialize};

/// The JSON body of a single `data:` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// An incremental piece of the assistant's answer.
    Content {
        #[serde(default)]
        content: String,
    },

    /// The logical end of the turn, optionally carrying the documents the
    /// answer was grounded on.
    Done {
        #[serde(
            default,
            deserialize_with = "null_as_empty",
            skip_serializing_if = "Vec::is_empty"
        )]
        rag_sources: Vec<RagSource>,
    },

    /// Any payload type this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Payload {
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn done(rag_sources: Vec<RagSource>) -> Self {
        Self::Done { rag_sources }
    }

    /// The payload's `type` tag, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Content { .. } => "content",
            Self::Done { .. } => "done",
            Self::Unknown => "unknown",
        }
    }
}

/// A retrieved document the assistant cited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub source: String,

    #[serde(default)]
    pub relevance: f64,

    #[serde(default)]
    pub content: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RagSource>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<RagSource>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
