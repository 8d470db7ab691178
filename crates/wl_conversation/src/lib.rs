pub mod conversation;
pub mod error;
pub mod turn;

pub use conversation::{Conversation, Phase, SessionId};
pub use error::Error;
pub use turn::{Citation, Role, SealReason, Turn, TurnState};
