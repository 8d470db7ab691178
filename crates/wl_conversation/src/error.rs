use crate::conversation::Phase;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("turn is sealed and can no longer change")]
    Sealed,

    #[error("no assistant turn is open")]
    NoOpenTurn,

    #[error("conversation is busy ({0})")]
    Busy(Phase),

    #[error("no user turn is awaiting a response")]
    NotAwaiting,

    #[error("message is empty")]
    EmptyInput,

    #[error("phase ({0}) does not match the conversation's turns")]
    InconsistentPhase(Phase),
}

impl Error {
    /// Whether this error is a violation of the streaming protocol, i.e. an
    /// attempt to modify a turn that is not (or no longer) open.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Sealed | Self::NoOpenTurn)
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
