use std::{io, pin::Pin, time::Duration};

use futures::{Stream, TryStreamExt as _};
use reqwest::{
    Response,
    header::{ACCEPT, CONTENT_TYPE, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::{codec::FramedRead, io::StreamReader};
use tracing::{error, trace};
use url::Url;
use wl_conversation::SessionId;
use wl_sse::{Frame, FrameCodec};

use crate::{
    error::{Error, Result},
    types::{ChatRequest, CreateSession, Feedback, History, Rating, Session},
};

/// Default API location.
pub const DEFAULT_BASE_URL: &str = "https://worldlink-ai.xyz:8100";

/// Default timeout for plain (non-streaming) requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A stream of decoded frames from the chat endpoint.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// Client for the chatbot API.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    codec: FrameCodec,
}

impl Client {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;

        // Make sure joining endpoint paths appends to, rather than replaces,
        // the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            timeout: DEFAULT_TIMEOUT,
            codec: FrameCodec::new(),
        })
    }

    /// Set the timeout for non-streaming requests.
    ///
    /// Streaming requests are not bound by this timeout, as a single answer
    /// can take arbitrarily long to complete.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum length of a single line in the event stream.
    #[must_use]
    pub const fn with_max_line_length(mut self, max_length: usize) -> Self {
        self.codec = self.codec.with_max_length(max_length);
        self
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a new chat session.
    pub async fn create_session(&self, session_type: &str, user_id: &str) -> Result<Session> {
        let body = CreateSession {
            session_type: session_type.to_owned(),
            user_id: user_id.to_owned(),
        };

        self.post("api/chatbot/sessions", &body).await
    }

    /// Fetch the stored messages of a session.
    pub async fn history(&self, session_id: &SessionId) -> Result<History> {
        self.get(&format!("api/chatbot/sessions/{session_id}/history"))
            .await
    }

    /// Rate the answers of a session.
    pub async fn submit_feedback(
        &self,
        session_id: &SessionId,
        rating: Rating,
        feedback_text: Option<String>,
    ) -> Result<serde_json::Value> {
        let body = Feedback {
            session_id: session_id.clone(),
            rating,
            feedback_text,
        };

        self.post("api/chatbot/feedback", &body).await
    }

    /// Send a message and stream the answer.
    ///
    /// Returns as soon as the response headers arrive. A non-success status
    /// is returned as [`Error::Api`]. Malformed frames are yielded as
    /// [`Frame::Malformed`] items, transport failures while reading the body
    /// as errors.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<FrameStream> {
        let url = self.endpoint("api/chatbot/chat/stream")?;

        trace!(
            %url,
            session_id = %request.session_id,
            use_rag = request.use_rag,
            "Opening chat stream."
        );

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(request)
            .send()
            .await?;

        let response = check_response(response).await?;

        let byte_stream = response.bytes_stream().map_err(io::Error::other);
        let frames = FramedRead::new(StreamReader::new(byte_stream), self.codec.clone())
            .map_err(Error::from);

        Ok(Box::pin(frames))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        trace!(%url, "Triggering GET request.");

        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        parse_json(check_response(response).await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path)?;
        trace!(%url, "Triggering POST request.");

        let response = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;

        parse_json(check_response(response).await?).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Into::into)
    }
}

/// Turn error statuses into [`Error::Api`].
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();

    trace!(
        status = status.as_u16(),
        content_length = response.content_length().unwrap_or_default(),
        content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap_or_default()),
        "Received response."
    );

    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    error!(status = code, %body, "Unexpected response.");

    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_owned()
    } else {
        body
    };

    Err(Error::Api { code, message })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(Into::into)
}
