use async_trait::async_trait;
use wl_client::{Client, FrameStream, types::ChatRequest};

/// Opens the event stream for a single chat turn.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<FrameStream, wl_client::Error>;
}

#[async_trait]
impl Transport for Client {
    async fn open(&self, request: &ChatRequest) -> Result<FrameStream, wl_client::Error> {
        self.chat_stream(request).await
    }
}
