use comfy_table::Row;
use serde_json::Value;
use tracing::info;
use wl_conversation::SessionId;

use crate::{
    Ctx,
    cmd::{Error, Output, Success},
};

#[derive(Debug, clap::Args)]
pub(crate) struct Session {}

impl Session {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        let config = &ctx.config().chat;
        let session = ctx
            .client
            .create_session(&config.session_type, &config.user_id)
            .await?;

        let mut rows = vec![Row::from(vec![
            "session_id".to_owned(),
            session.session_id.to_string(),
        ])];

        for (key, value) in session.extra {
            let value = match value {
                Value::String(value) => value,
                value => value.to_string(),
            };

            rows.push(Row::from(vec![key, value]));
        }

        Ok(Success::Details {
            title: Some("Session created".to_owned()),
            rows,
        })
    }
}

/// Use the given session, or create a new one.
pub(super) async fn open(ctx: &Ctx, id: Option<String>) -> Result<SessionId, Error> {
    if let Some(id) = id {
        return Ok(SessionId::new(id));
    }

    let config = &ctx.config().chat;
    let session = ctx
        .client
        .create_session(&config.session_type, &config.user_id)
        .await?;

    info!(session_id = %session.session_id, "Created chat session.");
    Ok(session.session_id)
}
