use comfy_table::Row;
use wl_conversation::SessionId;

use crate::{
    Ctx,
    cmd::{Output, Success},
};

#[derive(Debug, clap::Args)]
pub(crate) struct History {
    /// The session to show.
    session: String,
}

impl History {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        let history = ctx.client.history(&SessionId::new(self.session)).await?;

        if history.messages().is_empty() && ctx.term.is_tty {
            return Ok("No messages.".into());
        }

        let header = Row::from(vec!["Role", "Time", "Content"]);
        let rows = history
            .messages()
            .iter()
            .map(|message| {
                Row::from(vec![
                    message.role.clone(),
                    message.timestamp.clone().unwrap_or_default(),
                    message.content.clone(),
                ])
            })
            .collect();

        Ok(Success::Table { header, rows })
    }
}
