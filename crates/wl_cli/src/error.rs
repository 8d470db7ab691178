use std::io;

use crate::cmd;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// CLI Error types
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("Command error: {0}")]
    Command(#[from] cmd::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] wl_config::Error),

    #[error("Client error: {0}")]
    Client(#[from] wl_client::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
