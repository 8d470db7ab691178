use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{Error, Result},
    parse_positive,
};

pub const DEFAULT_BASE_URL: &str = "https://worldlink-ai.xyz:8100";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Chatbot API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the chatbot API.
    pub base_url: String,

    /// Timeout for plain (non-streaming) requests, in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            "base_url" => self.base_url = parse_url(path, value)?,
            "timeout_secs" => self.timeout_secs = parse_positive(path, value)?,
            _ => return Err(crate::set_error(path)),
        }

        Ok(())
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        parse_url("api.base_url", self.base_url.clone())?;

        if self.timeout_secs == 0 {
            return Err(Error::invalid("api.timeout_secs", "0", "a positive integer"));
        }

        Ok(())
    }
}

fn parse_url(key: &str, value: String) -> Result<String> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(Error::invalid(key, value, "an absolute http(s) URL")),
    }
}
