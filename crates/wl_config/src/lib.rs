//! Layered configuration for the `wl` client.
//!
//! Values are resolved from, in increasing order of precedence: built-in
//! defaults, a TOML file, `WL_*` environment variables, and explicit
//! `KEY=VALUE` assignments.

pub mod api;
pub mod chat;
mod error;
mod parse;
pub mod stream;

use serde::{Deserialize, Serialize};

pub use crate::{
    error::Error,
    parse::{
        APPLICATION, CONFIG_FILE_NAME, ENV_PREFIX, env_name, find_file, load, load_envs, load_file,
        parse_assignment, user_config_file,
    },
};
use crate::error::Result;

/// The complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Chatbot API configuration.
    pub api: api::Config,

    /// Chat session configuration.
    pub chat: chat::Config,

    /// Event stream configuration.
    pub stream: stream::Config,
}

impl Config {
    /// All keys accepted by [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "api.base_url",
        "api.timeout_secs",
        "chat.session_type",
        "chat.user_id",
        "chat.use_rag",
        "chat.idle_timeout_secs",
        "chat.greeting",
        "stream.max_line_length",
    ];

    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            _ if key.starts_with("api.") => self.api.set(key, &key[4..], value),
            _ if key.starts_with("chat.") => self.chat.set(key, &key[5..], value),
            _ if key.starts_with("stream.") => self.stream.set(key, &key[7..], value),
            _ => Err(set_error(key)),
        }
    }

    /// Check values that deserialization alone does not constrain.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.chat.validate()?;
        self.stream.validate()
    }
}

/// Error for an unknown key, listing the keys sharing its section, or all
/// keys if the section is unknown too.
pub(crate) fn set_error(key: &str) -> Error {
    let section = key.split_once('.').map(|(section, _)| format!("{section}."));
    let mut available_keys = Config::KEYS
        .iter()
        .filter(|k| section.as_ref().is_some_and(|s| k.starts_with(s.as_str())))
        .map(|&k| k.to_owned())
        .collect::<Vec<_>>();

    if available_keys.is_empty() {
        available_keys = Config::KEYS.iter().map(|&k| k.to_owned()).collect();
    }

    Error::UnknownConfigKey {
        key: key.to_owned(),
        available_keys,
    }
}

pub(crate) fn parse_bool(key: &str, value: String) -> Result<bool> {
    value
        .parse()
        .map_err(|_| Error::invalid(key, value, "true or false"))
}

pub(crate) fn parse_positive<T>(key: &str, value: String) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(Error::invalid(key, value, "a positive integer")),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
