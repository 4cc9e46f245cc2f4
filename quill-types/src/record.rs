//! JSON records exchanged with the generation service.

use serde::{Deserialize, Serialize};

/// The record carried in the payload of a `data: ` frame.
///
/// Every field is optional on the wire. A frame such as
/// `{"text":" upon","done":false}` appends `" upon"` to the output;
/// `{"text":"","done":true}` carries nothing to append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemChunk {
    /// Text fragment to append to the accumulated output.
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the server considers generation finished.
    #[serde(default)]
    pub done: bool,
    /// Error reported by the server for this stream, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl PoemChunk {
    /// The text fragment, if present and non-empty.
    pub fn fragment(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// The server-reported error, if present and non-empty.
    pub fn server_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Response of the service health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall service status (`"healthy"` when reachable).
    pub status: String,
    /// Model status: `"loaded"`, `"not loaded"`, or `"error"`.
    pub model_status: String,
    /// Number of streams currently being served.
    pub active_streams: usize,
}

impl HealthStatus {
    /// Whether the model behind the service is ready to generate.
    pub fn model_loaded(&self) -> bool {
        self.model_status == "loaded"
    }
}

/// Response of the active-streams listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStreams {
    /// Ids of the streams currently being served.
    pub active_streams: Vec<String>,
    /// Number of streams in `active_streams`.
    pub count: usize,
}
