//! Mock Ollama upstream for integration tests.
//!
//! Binds an ephemeral port on localhost and serves a handful of canned
//! endpoints that mimic Ollama's streaming and non-streaming responses.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use futures_util::stream;
use tokio::net::TcpListener;

/// Chunks emitted by `/api/generate`, splitting both markers.
pub const SPLIT_CHUNKS: [&str; 3] = ["Hello <thi", "nk>ignored reasoning</thin", "k> world!"];

/// Address that refuses connections (nothing listens on port 1).
pub const UNREACHABLE_UPSTREAM: &str = "http://127.0.0.1:1";

fn streamed(chunks: Vec<Bytes>) -> Response {
    let body = Body::from_stream(stream::iter(chunks.into_iter().map(Ok::<_, Infallible>)));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(body)
        .unwrap()
}

async fn generate() -> Response {
    streamed(SPLIT_CHUNKS.iter().map(|c| Bytes::from_static(c.as_bytes())).collect())
}

/// Non-streaming `/api/chat` body. Ollama's JSON encoder escapes `<` and
/// `>` inside strings.
pub const CHAT_BODY: &str = concat!(
    r#"{"model":"x","message":{"role":"assistant","content":""#,
    r"\u003cthink\u003e",
    "private plan",
    r"\u003c/think\u003e",
    r#"Final answer"},"done":true}"#
);

async fn chat() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (header::HeaderName::from_static("x-upstream"), "ollama"),
        ],
        CHAT_BODY,
    )
        .into_response()
}

async fn multibyte() -> Response {
    streamed(vec![
        Bytes::from_static(b"caf\xc3"),
        Bytes::from_static(b"\xa9 <think>x</think>ok"),
    ])
}

async fn failing() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":"model crashed <think>keep this</think>"}"#,
    )
        .into_response()
}

/// Error status whose body breaks off mid-transfer.
async fn failing_truncated() -> Response {
    let chunks = vec![
        Ok(Bytes::from_static(b"{\"error\":\"model cra")),
        Err(std::io::Error::other("upstream connection reset")),
    ];
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

/// Echo the request line and selected headers back as plain text.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{method} {uri} x-custom={} host={} body={}",
        header("x-custom"),
        header("host"),
        String::from_utf8_lossy(&body),
    )
}

fn router() -> Router {
    Router::new()
        .route("/api/version", get(|| async { r#"{"version":"0.6.4"}"# }))
        .route("/api/generate", post(generate))
        .route("/api/chat", post(chat))
        .route("/api/multibyte", post(multibyte))
        .route("/api/fail", post(failing))
        .route("/api/fail-truncated", post(failing_truncated))
        .route("/api/slow", post(slow))
        .route("/echo/{*rest}", any(echo))
}

/// Spawn the mock upstream and return its base URL.
pub async fn spawn_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{addr}")
}
