use std::io;

use tokio::{
    io::{AsyncBufReadExt as _, BufReader},
    sync::mpsc::UnboundedReceiver,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wl_chat::{ChatSession, Notification, Outcome, Transport, Update};
use wl_client::types::Rating;
use wl_conversation::Conversation;

use super::session;
use crate::{
    Ctx,
    cmd::{Output, Success},
    render::Renderer,
    signals::InterruptGuard,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Chat {
    /// Continue an existing session instead of creating a new one.
    #[arg(short, long)]
    session: Option<String>,

    /// Answer without retrieving supporting documents.
    #[arg(long)]
    no_rag: bool,
}

impl Chat {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        let session_id = session::open(ctx, self.session).await?;
        let greeting = ctx.config().chat.greeting.clone();

        let conversation = Conversation::new()
            .with_session_id(session_id.clone())
            .with_greeting(greeting.clone());

        let (session, mut updates) = ChatSession::new(ctx.client.clone(), conversation);
        let session = session.with_options(ctx.chat_options(self.no_rag));

        let mut renderer = Renderer::new(io::stdout(), io::stderr(), ctx.term.color());
        renderer.info(&format!(
            "Session {session_id}. Press Ctrl-C to stop an answer, type /up or /down to rate \
             the answers, or /quit to leave."
        ))?;
        renderer.greeting(&greeting)?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            renderer.prompt()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };

            let Some(line) = line else {
                break;
            };

            let message = match Input::parse(&line) {
                Input::Empty => continue,
                Input::Quit => break,
                Input::Rate(rating) => {
                    match ctx.client.submit_feedback(&session_id, rating, None).await {
                        Ok(_) => renderer.info("Thanks for your feedback.")?,
                        Err(error) => {
                            warn!(%error, "Failed to submit feedback.");
                            renderer.render(&Update::Notification(Notification::error(
                                "Error",
                                "Failed to submit feedback",
                            )))?;
                        }
                    }

                    continue;
                }
                Input::Message(message) => message,
            };

            let result = drive(&session, &mut updates, message, |update| {
                if let Err(error) = renderer.render(&update) {
                    warn!(%error, "Failed to render update.");
                }
            })
            .await;

            match result {
                Ok(Outcome::Rejected(rejection)) => {
                    debug!(?rejection, "Message not sent.");
                }
                Ok(outcome) => debug!(?outcome, "Turn finished."),
                // Already shown as a notification.
                Err(error) => debug!(%error, "Turn failed."),
            }
        }

        Ok(Success::Ok)
    }
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Rate(Rating),
    Message(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/quit" | "/exit" => Self::Quit,
            "/up" => Self::Rate(Rating::UP),
            "/down" => Self::Rate(Rating::DOWN),
            _ => Self::Message(line),
        }
    }
}

/// Send a message, passing every update to `on_update` as it arrives.
///
/// Pressing Ctrl-C while the answer streams cancels the turn.
pub(super) async fn drive<T: Transport>(
    session: &ChatSession<T>,
    updates: &mut UnboundedReceiver<Update>,
    message: &str,
    mut on_update: impl FnMut(Update),
) -> Result<Outcome, wl_chat::Error> {
    let cancel = CancellationToken::new();
    let _interrupt = InterruptGuard::new(cancel.clone());

    let submit = session.submit(message, &cancel);
    tokio::pin!(submit);

    let result = loop {
        tokio::select! {
            result = &mut submit => break result,
            Some(update) = updates.recv() => on_update(update),
        }
    };

    while let Ok(update) = updates.try_recv() {
        on_update(update);
    }

    result
}
