mod ask;
mod chat;
mod feedback;
mod history;
mod session;

use std::{fmt, num::NonZeroI32};

use comfy_table::Row;
use serde_json::Value;

use crate::Ctx;

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Chat with the assistant interactively.
    #[command(visible_alias = "c")]
    Chat(chat::Chat),

    /// Ask the assistant a single question.
    #[command(visible_alias = "a")]
    Ask(ask::Ask),

    /// Create a new chat session.
    #[command(visible_alias = "s")]
    Session(session::Session),

    /// Show the stored messages of a session.
    #[command(visible_alias = "h")]
    History(history::History),

    /// Rate the answers of a session.
    #[command(visible_alias = "f")]
    Feedback(feedback::Feedback),
}

impl Commands {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        match self {
            Commands::Chat(args) => args.run(ctx).await,
            Commands::Ask(args) => args.run(ctx).await,
            Commands::Session(args) => args.run(ctx).await,
            Commands::History(args) => args.run(ctx).await,
            Commands::Feedback(args) => args.run(ctx).await,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Commands::Chat(_) => "chat",
            Commands::Ask(_) => "ask",
            Commands::Session(_) => "session",
            Commands::History(_) => "history",
            Commands::Feedback(_) => "feedback",
        }
    }
}

pub(crate) type Output = std::result::Result<Success, Error>;

/// Exit code of a failed command, unless it specifies its own.
const FAILURE: NonZeroI32 = NonZeroI32::new(1).unwrap();

/// The type of output that should be printed to the screen.
#[derive(Debug)]
pub(crate) enum Success {
    /// The command was successful.
    Ok,

    /// Single message to be printed to the screen.
    Message(String),

    /// List of details to be printed in a table.
    Table { header: Row, rows: Vec<Row> },

    /// Details of a single item to be printed.
    Details {
        title: Option<String>,
        rows: Vec<Row>,
    },

    /// JSON value to be printed.
    Json(Value),
}

impl From<()> for Success {
    fn from(_value: ()) -> Self {
        Self::Ok
    }
}

impl From<String> for Success {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for Success {
    fn from(value: &str) -> Self {
        value.to_owned().into()
    }
}

impl From<Value> for Success {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) struct Error {
    /// The error code.
    ///
    /// Used to exit the CLI with a specific exit code. This is usually `1`.
    pub(super) code: NonZeroI32,

    /// The optional error message to be displayed to the user.
    pub(super) message: Option<String>,

    /// Metadata to be displayed to the user.
    pub(super) metadata: Vec<(String, Value)>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message.as_deref().unwrap_or_default())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        (1, error).into()
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        error.to_owned().into()
    }
}

impl From<(i32, String)> for Error {
    fn from((code, message): (i32, String)) -> Self {
        (code, message, vec![]).into()
    }
}

impl From<(i32, String, Vec<(String, Value)>)> for Error {
    fn from((code, message, metadata): (i32, String, Vec<(String, Value)>)) -> Self {
        Self {
            code: NonZeroI32::new(code).unwrap_or(FAILURE),
            message: Some(message),
            metadata,
        }
    }
}

impl From<Vec<(&str, Value)>> for Error {
    fn from(mut metadata: Vec<(&str, Value)>) -> Self {
        let message = metadata
            .iter()
            .position(|(k, _)| *k == "message")
            .and_then(|i| metadata.remove(i).1.as_str().map(ToString::to_string))
            .unwrap_or_else(|| "Application error".to_owned());

        let metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<Vec<_>>();

        (1, message, metadata).into()
    }
}

impl From<Vec<(&str, String)>> for Error {
    fn from(metadata: Vec<(&str, String)>) -> Self {
        metadata
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<crate::error::Error> for Error {
    fn from(error: crate::error::Error) -> Self {
        use crate::error::Error::*;

        match error {
            Command(error) => error,
            Config(error) => error.into(),
            Client(error) => error.into(),
            Io(error) => error.into(),
        }
    }
}

fn with_cause(
    mut error: &dyn std::error::Error,
    message: impl Into<String>,
) -> Vec<(&'static str, String)> {
    let mut causes = vec![("message", message.into()), ("", format!("{error:#}"))];
    while let Some(cause) = error.source() {
        error = cause;
        causes.push(("", format!("{error:#}")));
    }

    causes
}

macro_rules! impl_from_error {
    ($error:ty, $message:expr) => {
        impl From<$error> for Error {
            fn from(error: $error) -> Self {
                with_cause(&error, $message).into()
            }
        }
    };
}

impl_from_error!(wl_config::Error, "Config error");
impl_from_error!(wl_conversation::Error, "Conversation error");
impl_from_error!(serde_json::Error, "Error while parsing JSON");
impl_from_error!(std::io::Error, "IO error");

impl From<wl_client::Error> for Error {
    fn from(error: wl_client::Error) -> Self {
        use wl_client::Error::*;

        let metadata: Vec<(&str, Value)> = match error {
            Api { code, message } => vec![
                ("message", "Chatbot API error".into()),
                ("status", code.into()),
                ("error", message.into()),
            ],
            Rating(rating) => vec![
                ("message", "Invalid rating".into()),
                ("rating", rating.into()),
                ("expected", "1 to 5".into()),
            ],
            error => return with_cause(&error, "Error while talking to the chatbot API").into(),
        };

        Self::from(metadata)
    }
}

impl From<wl_chat::Error> for Error {
    fn from(error: wl_chat::Error) -> Self {
        use wl_chat::{Error::*, TransportError};

        match error {
            Transport(TransportError::Client(error)) => error.into(),
            Transport(TransportError::IdleTimeout(timeout)) => {
                let metadata: Vec<(&str, Value)> = vec![
                    ("message", "The response stopped arriving".into()),
                    ("idle_timeout_secs", timeout.as_secs().into()),
                ];

                metadata.into()
            }
            Conversation(error) => error.into(),
        }
    }
}
