use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    parse_positive,
};

/// Longest accepted event stream line, matching the decoder's own default.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Event stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Longest accepted line of the event stream, in bytes.
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl Config {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            "max_line_length" => self.max_line_length = parse_positive(path, value.into())?,
            _ => return Err(crate::set_error(path)),
        }

        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_line_length == 0 {
            return Err(Error::invalid(
                "stream.max_line_length",
                "0",
                "a positive integer",
            ));
        }

        Ok(())
    }
}
