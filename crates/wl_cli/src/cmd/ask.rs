use std::io;

use serde_json::json;
use tracing::warn;
use wl_chat::{ChatSession, Outcome, Rejection, Update};
use wl_conversation::Conversation;

use super::{chat::drive, session};
use crate::{
    Ctx,
    cmd::{Output, Success},
    render::Renderer,
};

/// Exit code of a command interrupted with Ctrl-C.
const INTERRUPTED: i32 = 130;

#[derive(Debug, clap::Args)]
pub(crate) struct Ask {
    /// The question to ask.
    #[arg(required = true, num_args = 1..)]
    message: Vec<String>,

    /// Ask within an existing session instead of creating a new one.
    #[arg(short, long)]
    session: Option<String>,

    /// Answer without retrieving supporting documents.
    #[arg(long)]
    no_rag: bool,
}

impl Ask {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        let message = self.message.join(" ");
        let session_id = session::open(ctx, self.session).await?;

        let conversation = Conversation::new().with_session_id(session_id.clone());
        let (session, mut updates) = ChatSession::new(ctx.client.clone(), conversation);
        let session = session.with_options(ctx.chat_options(self.no_rag));

        // Failures are returned as errors, so notifications are not printed.
        let is_tty = ctx.term.is_tty;
        let mut renderer = Renderer::new(io::stdout(), io::sink(), ctx.term.color());
        let outcome = drive(&session, &mut updates, &message, |update| {
            if !is_tty || matches!(update, Update::Notification(_)) {
                return;
            }

            if let Err(error) = renderer.render(&update) {
                warn!(%error, "Failed to render update.");
            }
        })
        .await?;

        let index = match outcome {
            Outcome::Completed { index }
            | Outcome::Partial { index }
            | Outcome::Cancelled { index: Some(index) } => index,
            Outcome::Cancelled { index: None } => {
                return Err((INTERRUPTED, "Cancelled before the answer started.".to_owned()).into());
            }
            Outcome::Rejected(Rejection::EmptyInput) => return Err("The question is empty.".into()),
            Outcome::Rejected(rejection) => {
                return Err(format!("The question was not sent: {rejection:?}").into());
            }
        };

        if is_tty {
            return Ok(Success::Ok);
        }

        let conversation = session.snapshot();
        let Some(turn) = conversation.get(index) else {
            return Err("The answer is missing from the conversation.".into());
        };

        Ok(json!({
            "session_id": session_id,
            "answer": turn.text(),
            "status": turn.seal_reason(),
            "citations": turn.citations(),
        })
        .into())
    }
}
