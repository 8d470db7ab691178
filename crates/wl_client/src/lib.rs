mod client;
mod error;
pub mod types;

pub use client::{Client, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, FrameStream};
pub use error::Error;
