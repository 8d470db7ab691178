use std::time::Duration;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] wl_conversation::Error),
}

/// The connection to the chat endpoint failed, or stopped delivering data.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Client(#[from] wl_client::Error),

    #[error("no data received for {} seconds", .0.as_secs())]
    IdleTimeout(Duration),
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
