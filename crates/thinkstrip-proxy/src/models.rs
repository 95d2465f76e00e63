//! JSON bodies the proxy produces itself.
//!
//! Everything else is the upstream's own payload, passed through or filtered.

use serde::Serialize;

/// Error body in Ollama's shape: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthResponse {
    /// Upstream answered the probe.
    pub fn healthy(target: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            target: Some(target.into()),
            error: None,
        }
    }

    /// Upstream could not be reached.
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            target: None,
            error: Some(error.into()),
        }
    }
}
