use clap::ArgGroup;
use wl_client::types::Rating;
use wl_conversation::SessionId;

use crate::{
    Ctx,
    cmd::{Output, Success},
};

#[derive(Debug, clap::Args)]
#[command(group(ArgGroup::new("score").required(true).args(["up", "down", "rating"])))]
pub(crate) struct Feedback {
    /// The session to rate.
    session: String,

    /// The answers were helpful.
    #[arg(long)]
    up: bool,

    /// The answers were not helpful.
    #[arg(long)]
    down: bool,

    /// Rate from 1 (worst) to 5 (best).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: Option<u8>,

    /// An optional comment.
    #[arg(short, long)]
    text: Option<String>,
}

impl Feedback {
    pub(crate) async fn run(self, ctx: &mut Ctx) -> Output {
        let rating = match (self.up, self.down, self.rating) {
            (true, _, _) => Rating::UP,
            (_, true, _) => Rating::DOWN,
            (_, _, Some(value)) => Rating::new(value)?,
            (false, false, None) => return Err("Provide one of --up, --down or --rating.".into()),
        };

        let response = ctx
            .client
            .submit_feedback(&SessionId::new(self.session), rating, self.text)
            .await?;

        if ctx.term.is_tty {
            return Ok("Thanks for your feedback.".into());
        }

        Ok(Success::Json(response))
    }
}
