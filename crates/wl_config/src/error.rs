use std::path::PathBuf;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse configuration file {}: {error}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        error: toml::de::Error,
    },

    #[error("Configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Unknown config key: {key}\n\nAvailable keys:\n  - {}", available_keys.join("\n  - "))]
    UnknownConfigKey {
        key: String,
        available_keys: Vec<String>,
    },

    #[error("Invalid config value \"{value}\" for key {key}. Expected {need}.")]
    InvalidConfigValue {
        key: String,
        value: String,
        need: String,
    },

    #[error("Invalid assignment \"{0}\", expected KEY=VALUE.")]
    InvalidAssignment(String),
}

impl Error {
    pub(crate) fn invalid(key: &str, value: impl Into<String>, need: &str) -> Self {
        Self::InvalidConfigValue {
            key: key.to_owned(),
            value: value.into(),
            need: need.to_owned(),
        }
    }
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
