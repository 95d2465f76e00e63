//! Per-request decisions derived from the caller's request body.

use serde_json::Value;

/// Whether the caller asked for a streamed response.
///
/// Ollama streams by default, so anything short of an explicit
/// `"stream": false` in a JSON object body counts as streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDecision {
    pub stream: bool,
}

impl Default for StreamDecision {
    fn default() -> Self {
        Self { stream: true }
    }
}

impl StreamDecision {
    /// Derive the decision from a raw request body.
    ///
    /// Empty bodies, non-JSON bodies, a missing field and non-boolean values
    /// all fall back to streaming.
    #[must_use]
    pub fn from_request_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        let stream = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|json| json.get("stream").and_then(Value::as_bool))
            .unwrap_or(true);
        Self { stream }
    }

    pub const fn is_streaming(self) -> bool {
        self.stream
    }
}
