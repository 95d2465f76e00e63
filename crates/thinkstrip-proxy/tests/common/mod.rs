//! Shared helpers for thinkstrip-proxy integration tests.

pub mod upstream;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tokio_util::sync::CancellationToken;

use thinkstrip_core::ProxySettings;
use thinkstrip_proxy::{ProxyState, create_router};

/// Settings pointing at `upstream_url`, everything else default.
pub fn test_settings(upstream_url: &str) -> ProxySettings {
    ProxySettings {
        upstream_url: upstream_url.to_string(),
        bind_host: "127.0.0.1".to_string(),
        port: 0,
        ..ProxySettings::default()
    }
}

/// Proxy router in front of `settings.upstream_url`.
pub fn proxy_router(settings: ProxySettings) -> Router {
    let state = ProxyState::new(settings, CancellationToken::new()).unwrap();
    create_router(state)
}

/// POST a JSON body to `path`.
pub fn json_request(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}
