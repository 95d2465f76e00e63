//! Request forwarding to the upstream Ollama service.
//!
//! This module is the dispatcher: it replays the inbound request against the
//! upstream, then routes the response body either through a one-shot filter
//! pass (non-streaming) or through the streaming pump.

use axum::{
    Json,
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use thinkstrip_core::{ProxySettings, StreamDecision, ThinkTagFilter, Utf8ChunkDecoder};

use crate::error::ForwardError;
use crate::filtered_stream::filtered_body;
use crate::models::ErrorResponse;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Check if a request header should be forwarded upstream.
fn should_forward_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    !HOP_BY_HOP_HEADERS.contains(&lower.as_str()) && lower != "host" && lower != "content-length"
}

/// Check if an upstream response header should be copied to the client.
///
/// `content-length` is dropped because filtering changes the body length.
fn should_copy_response_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    !HOP_BY_HOP_HEADERS.contains(&lower.as_str()) && lower != "content-length"
}

/// An inbound request, as received from the client.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forward a request upstream and return the (filtered) response.
///
/// Never fails: connectivity problems become 502/504 responses, upstream
/// error statuses are passed through unfiltered.
///
/// # Arguments
///
/// * `client` - HTTP client to use for the request
/// * `settings` - Upstream address and timeouts
/// * `request` - The inbound request to replay
/// * `cancel` - Per-request cancellation token for the streaming path
pub async fn forward_request(
    client: &Client,
    settings: &ProxySettings,
    request: InboundRequest,
    cancel: CancellationToken,
) -> Response {
    let target = settings.upstream_target(request.uri.path(), request.uri.query());
    let decision = StreamDecision::from_request_body(&request.body);

    info!(method = %request.method, target = %target, "Proxying request");
    debug!(headers = ?request.headers, "Request headers");
    if !request.body.is_empty() {
        debug!(
            body = %String::from_utf8_lossy(&request.body),
            streaming = decision.is_streaming(),
            "Request body"
        );
    }

    let upstream = match send_upstream(client, settings, &target, request).await {
        Ok(resp) => resp,
        Err(e) => {
            error!("{e}");
            return e.into_response();
        }
    };

    let status = upstream.status();
    info!(status = status.as_u16(), "Upstream responded");

    // Error payloads are not reasoning output; return them untouched.
    if status.as_u16() >= 400 {
        return passthrough_error(upstream).await;
    }

    if decision.is_streaming() {
        forward_streaming_response(upstream, cancel)
    } else {
        forward_non_streaming_response(upstream).await
    }
}

/// Replay the request against `target`, bounded by the upstream timeout.
///
/// The timeout covers only the wait for the response head; reading a
/// streamed body afterwards is unbounded.
async fn send_upstream(
    client: &Client,
    settings: &ProxySettings,
    target: &str,
    request: InboundRequest,
) -> Result<reqwest::Response, ForwardError> {
    let mut req_builder = client.request(request.method, target);

    for (name, value) in &request.headers {
        if should_forward_header(name.as_str()) {
            req_builder = req_builder.header(name, value);
        }
    }

    if !request.body.is_empty() {
        req_builder = req_builder.body(request.body);
    }

    let timeout = settings.upstream_timeout();
    match tokio::time::timeout(timeout, req_builder.send()).await {
        Ok(Ok(resp)) => Ok(resp),
        Ok(Err(e)) => Err(ForwardError::from_send(&e, timeout)),
        Err(_) => Err(ForwardError::UpstreamTimeout(timeout)),
    }
}

/// Copy upstream response headers that survive the proxy hop.
fn copy_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if should_copy_response_header(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Return an upstream error response verbatim.
///
/// If its body cannot be read, the status is kept and the body replaced by
/// a JSON error.
async fn passthrough_error(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    error!(status = status.as_u16(), "Upstream error");
    let error_bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Keep the upstream status; describe the lost body instead.
            let err = ForwardError::UpstreamBody(e.to_string());
            warn!(status = status.as_u16(), "{err}");
            return (status, Json(ErrorResponse::new(err.to_string()))).into_response();
        }
    };
    error!("Error response: {}", String::from_utf8_lossy(&error_bytes));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    build_response(status, headers, Body::from(error_bytes))
}

/// Stream the upstream body through the filter as it arrives.
fn forward_streaming_response(upstream: reqwest::Response, cancel: CancellationToken) -> Response {
    let status = upstream.status();
    let headers = copy_response_headers(upstream.headers());
    let body = filtered_body(upstream.bytes_stream(), cancel);
    build_response(status, headers, body)
}

/// Read the whole upstream body, filter it once and return it.
async fn forward_non_streaming_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = copy_response_headers(upstream.headers());

    let body_bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = ForwardError::UpstreamBody(e.to_string());
            error!("{err}");
            return err.into_response();
        }
    };

    let filtered = filter_whole_body(&body_bytes);
    if filtered.len() != body_bytes.len() {
        debug!(
            original = body_bytes.len(),
            filtered = filtered.len(),
            "Filtered non-streaming content"
        );
    }

    build_response(status, headers, Body::from(filtered))
}

/// Run a complete body through a fresh filter in one pass.
pub fn filter_whole_body(body: &[u8]) -> String {
    let mut decoder = Utf8ChunkDecoder::new();
    let mut filter = ThinkTagFilter::new();
    let mut text = decoder.decode(body);
    text.push_str(&decoder.finish());

    let mut filtered = filter.process_chunk(&text);
    filtered.push_str(&filter.flush());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_forward_header() {
        // Should forward
        assert!(should_forward_header("accept"));
        assert!(should_forward_header("content-type"));
        assert!(should_forward_header("authorization"));
        assert!(should_forward_header("x-custom-header"));

        // Should NOT forward
        assert!(!should_forward_header("connection"));
        assert!(!should_forward_header("Host"));
        assert!(!should_forward_header("content-length"));
        assert!(!should_forward_header("transfer-encoding"));
    }

    #[test]
    fn test_response_headers_drop_length_and_hop_by_hop() {
        let mut upstream = HeaderMap::new();
        upstream.insert("content-type", HeaderValue::from_static("application/x-ndjson"));
        upstream.insert("content-length", HeaderValue::from_static("42"));
        upstream.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        upstream.insert("x-request-id", HeaderValue::from_static("abc123"));

        let copied = copy_response_headers(&upstream);
        assert_eq!(copied.get("content-type").unwrap(), "application/x-ndjson");
        assert_eq!(copied.get("x-request-id").unwrap(), "abc123");
        assert!(copied.get("content-length").is_none());
        assert!(copied.get("transfer-encoding").is_none());
    }

    #[test]
    fn test_filter_whole_body_handles_both_forms() {
        let body = br#"{"message":{"content":"<think>plan</think>\u003cthink\u003emore\u003c/think\u003eAnswer"}}"#;
        assert_eq!(
            filter_whole_body(body),
            r#"{"message":{"content":"Answer"}}"#
        );
    }

    #[test]
    fn test_filter_whole_body_drops_unterminated_span() {
        assert_eq!(filter_whole_body(b"Answer <think>cut off"), "Answer ");
    }
}
