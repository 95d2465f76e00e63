//! Forwarding errors and their HTTP mapping.
//!
//! Only connectivity problems are local errors. Upstream error statuses are
//! passed through as-is by the dispatcher and never become a `ForwardError`.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors that can occur while talking to the upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Connection refused, DNS failure, reset before the response head, ...
    #[error("Failed to forward request: {0}")]
    UpstreamUnreachable(String),

    /// No response head within the configured ceiling.
    #[error("Failed to forward request: upstream did not respond within {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// The upstream answered but the (non-streamed) body could not be read.
    #[error("Failed to read upstream response: {0}")]
    UpstreamBody(String),
}

impl ForwardError {
    /// Classify a reqwest error raised while sending the request.
    pub fn from_send(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(timeout)
        } else {
            Self::UpstreamUnreachable(err.to_string())
        }
    }

    /// HTTP status reported to the client.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UpstreamUnreachable(_) | Self::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_is_502() {
        let err = ForwardError::UpstreamUnreachable("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Failed to forward request: connection refused");
    }

    #[test]
    fn test_timeout_is_504() {
        let err = ForwardError::UpstreamTimeout(Duration::from_secs(120));
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_body_read_failure_is_502() {
        let err = ForwardError::UpstreamBody("reset".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
