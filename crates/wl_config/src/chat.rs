use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    parse_bool, parse_positive,
};

pub const DEFAULT_GREETING: &str =
    "Hello! I'm your AI banking assistant. How can I help you today?";

/// Chat session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Session type sent when creating a session.
    pub session_type: String,

    /// User the sessions are created for.
    pub user_id: String,

    /// Ground answers on retrieved documents.
    pub use_rag: bool,

    /// Give up on a response after this many seconds without data.
    pub idle_timeout_secs: u64,

    /// First assistant message of a new session. Shown locally, never sent.
    pub greeting: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_type: "general".to_owned(),
            user_id: "user123".to_owned(),
            use_rag: true,
            idle_timeout_secs: 30,
            greeting: DEFAULT_GREETING.to_owned(),
        }
    }
}

impl Config {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            "session_type" => self.session_type = value,
            "user_id" => self.user_id = value,
            "use_rag" => self.use_rag = parse_bool(path, value)?,
            "idle_timeout_secs" => self.idle_timeout_secs = parse_positive(path, value)?,
            "greeting" => self.greeting = value,
            _ => return Err(crate::set_error(path)),
        }

        Ok(())
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.idle_timeout_secs == 0 {
            return Err(Error::invalid(
                "chat.idle_timeout_secs",
                "0",
                "a positive integer",
            ));
        }

        Ok(())
    }
}
