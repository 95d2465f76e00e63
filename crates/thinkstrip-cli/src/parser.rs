//! Command-line arguments with environment fallbacks.
//!
//! Every flag can also be set through the environment (or a `.env` file,
//! loaded by `main` before parsing), which is how the proxy is usually
//! configured inside a container.

use clap::Parser;

use thinkstrip_core::{
    DEFAULT_BIND_HOST, DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_MAX_REQUEST_BODY_BYTES,
    DEFAULT_PROXY_PORT, DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL, ProxySettings,
};

/// Transparent Ollama proxy that strips `<think>` reasoning spans.
#[derive(Debug, Parser)]
#[command(name = "thinkstrip")]
#[command(about = "Proxy Ollama and strip <think> reasoning spans from responses")]
#[command(version)]
pub struct Cli {
    /// Upstream Ollama base URL
    #[arg(long = "upstream", env = "OLLAMA_HOST", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream: String,

    /// Address to listen on
    #[arg(long = "host", env = "BIND_HOST", default_value = DEFAULT_BIND_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long = "port", env = "PORT", default_value_t = DEFAULT_PROXY_PORT)]
    pub port: u16,

    /// Log headers, request bodies and removed spans
    #[arg(short = 'v', long = "debug", env = "DEBUG")]
    pub debug: bool,

    /// Seconds to wait for the upstream response head
    #[arg(
        long = "upstream-timeout",
        env = "UPSTREAM_TIMEOUT_SECS",
        default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS
    )]
    pub upstream_timeout: u64,

    /// Seconds allowed for the /health upstream probe
    #[arg(
        long = "health-timeout",
        env = "HEALTH_TIMEOUT_SECS",
        default_value_t = DEFAULT_HEALTH_TIMEOUT_SECS
    )]
    pub health_timeout: u64,

    /// Largest accepted request body in bytes
    #[arg(
        long = "max-body-bytes",
        env = "MAX_REQUEST_BODY_BYTES",
        default_value_t = DEFAULT_MAX_REQUEST_BODY_BYTES
    )]
    pub max_body_bytes: usize,
}

impl Cli {
    /// Convert parsed arguments into proxy settings (not yet validated).
    pub fn into_settings(self) -> ProxySettings {
        ProxySettings {
            upstream_url: self.upstream,
            bind_host: self.host,
            port: self.port,
            debug: self.debug,
            upstream_timeout_secs: self.upstream_timeout,
            health_timeout_secs: self.health_timeout,
            max_request_body_bytes: self.max_body_bytes,
        }
    }
}
