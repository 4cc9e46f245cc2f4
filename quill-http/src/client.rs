//! HTTP transport struct and builder.

use std::future::Future;

use futures::StreamExt;
use quill_types::{
    ActiveStreams, ByteStream, GENERATE_PATH, GenerateRequest, HealthStatus, PoemChunk,
    ResponseStream, Transport, TransportError,
};
use serde::de::DeserializeOwned;

use crate::error::{check_status, map_read_error, map_reqwest_error};

/// Default generation service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the base URL in [`HttpTransport::from_env`].
pub const API_URL_ENV: &str = "QUILL_API_URL";

/// Response header carrying the server-assigned stream id.
pub const STREAM_ID_HEADER: &str = "x-stream-id";

/// HTTP client for the generation service.
///
/// Implements [`Transport`] for use by the session controller.
///
/// # Example
///
/// ```no_run
/// use quill_http::HttpTransport;
///
/// let transport = HttpTransport::new().base_url("http://localhost:8000");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Service base URL, without a trailing slash.
    pub(crate) base_url: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport pointed at `http://localhost:8000`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport configured from the process environment.
    ///
    /// Reads `QUILL_API_URL`; falls back to the default base URL when unset
    /// or blank.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a transport configured through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(url) => Self::new().base_url(url),
            None => Self::new(),
        }
    }

    /// Override the service base URL.
    ///
    /// Useful for testing with a local mock server or a remote deployment.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured `reqwest` client (proxies, timeouts, TLS roots).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The configured base URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generate a complete poem in one request (`POST /api/generate-poem-sync`).
    pub async fn generate_sync(
        &self,
        request: &GenerateRequest,
    ) -> Result<PoemChunk, TransportError> {
        let url = self.endpoint("/api/generate-poem-sync");
        tracing::debug!(url = %url, "sending synchronous generation request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status())?;
        read_json(response).await
    }

    /// Query service health (`GET /api/health`).
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.get_json("/api/health").await
    }

    /// List the streams the service is currently serving (`GET /api/active-streams`).
    pub async fn active_streams(&self) -> Result<ActiveStreams, TransportError> {
        self.get_json("/api/active-streams").await
    }

    /// Ask the service to stop producing a stream (`POST /api/cancel-stream/{id}`).
    ///
    /// An unknown id yields `TransportError::Status(404)`.
    pub async fn cancel_stream(&self, stream_id: &str) -> Result<(), TransportError> {
        let url = self.endpoint(&format!("/api/cancel-stream/{stream_id}"));
        tracing::debug!(url = %url, "cancelling remote stream");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status())?;
        read_json(response).await
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let text = response.text().await.map_err(map_read_error)?;
    serde_json::from_str(&text)
        .map_err(|e| TransportError::InvalidResponse(format!("invalid JSON response: {e}")))
}

impl Transport for HttpTransport {
    /// Open the streaming endpoint.
    ///
    /// A non-success status resolves to [`TransportError::Status`] and the
    /// body is dropped unread. On success the body is returned unread.
    fn open(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<ResponseStream, TransportError>> + Send {
        let url = self.endpoint(GENERATE_PATH);
        let http_client = self.client.clone();
        let body = request.clone();

        async move {
            tracing::debug!(
                url = %url,
                max_length = body.max_length,
                temperature = body.temperature,
                "opening generation stream"
            );

            let response = http_client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;
            check_status(response.status())?;

            let stream_id = response
                .headers()
                .get(STREAM_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body: ByteStream =
                Box::pin(response.bytes_stream().map(|r| r.map_err(map_read_error)));

            Ok(ResponseStream { stream_id, body })
        }
    }
}
