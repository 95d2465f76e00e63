//! Axum HTTP server for the think-stripping proxy.
//!
//! This module provides the `serve()` function that runs the proxy server
//! using a pre-bound TcpListener, plus the router used by tests.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use thinkstrip_core::ProxySettings;

use crate::forward::{InboundRequest, forward_request};
use crate::models::HealthResponse;

/// Shared application state for the proxy server.
#[derive(Clone)]
pub struct ProxyState {
    /// HTTP client for forwarding requests upstream.
    client: Client,
    /// Settings, fixed at startup.
    settings: Arc<ProxySettings>,
    /// Root token; each streaming response gets a child of it.
    shutdown: CancellationToken,
}

impl ProxyState {
    /// Build the state and its upstream HTTP client.
    pub fn new(settings: ProxySettings, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(settings.upstream_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            settings: Arc::new(settings),
            shutdown,
        })
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }
}

/// Build the router: `/health` plus a catch-all forwarding fallback.
pub fn create_router(state: ProxyState) -> Router {
    let body_limit = state.settings.max_request_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .fallback(proxy)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Start the proxy server with a pre-bound listener.
///
/// Runs until the cancellation token is triggered. In-flight streams are
/// cancelled along with it.
///
/// # Returns
///
/// Returns `Ok(())` on clean shutdown, or an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    settings: ProxySettings,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Starting thinkstrip proxy on http://{addr}");
    info!("Forwarding requests to {}", settings.upstream_url);
    info!("Debug mode: {}", settings.debug);

    let state = ProxyState::new(settings, cancel.clone())?;
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Proxy server shut down");
    Ok(())
}

/// Health check endpoint: probes the upstream's `/api/version`.
///
/// Any HTTP answer counts as healthy; only transport failures do not.
async fn health_check(State(state): State<ProxyState>) -> Response {
    let probe_url = state.settings.upstream_target("/api/version", None);
    debug!(url = %probe_url, "Health probe");

    match state
        .client
        .get(&probe_url)
        .timeout(state.settings.health_timeout())
        .send()
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse::healthy(state.settings.upstream_url.clone())),
        )
            .into_response(),
        Err(e) => {
            let message = format!("Health check failed: {e}");
            error!("{message}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(message)),
            )
                .into_response()
        }
    }
}

/// Catch-all handler: forward any method and path upstream.
async fn proxy(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InboundRequest {
        method,
        uri,
        headers,
        body,
    };
    forward_request(
        &state.client,
        &state.settings,
        request,
        state.shutdown.child_token(),
    )
    .await
}
