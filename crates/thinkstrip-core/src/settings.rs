//! Proxy settings and validation.
//!
//! Settings are built once at startup (flags and environment, see the CLI)
//! and passed by value into the server. Nothing here is global.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default upstream Ollama base URL (the compose service name).
pub const DEFAULT_UPSTREAM_URL: &str = "http://ollama:11434";

/// Default listen address: all interfaces, so the proxy can stand in for Ollama.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port, Ollama's own.
pub const DEFAULT_PROXY_PORT: u16 = 11434;

/// Ceiling for waiting on the upstream response head.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// Timeout for the `/health` reachability probe.
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Largest accepted inbound request body (64 MiB, room for base64 images).
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Runtime configuration for the proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxySettings {
    /// Base URL of the upstream inference service.
    pub upstream_url: String,

    /// Address to bind the listener to.
    pub bind_host: String,

    /// Port to bind the listener to (0 picks a free port).
    pub port: u16,

    /// Verbose logging of headers, request bodies and removed spans.
    pub debug: bool,

    pub upstream_timeout_secs: u64,

    pub health_timeout_secs: u64,

    pub max_request_body_bytes: usize,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProxySettings {
    /// Create settings with the documented defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
            debug: false,
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            health_timeout_secs: DEFAULT_HEALTH_TIMEOUT_SECS,
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
        }
    }

    /// Upstream base URL without a trailing slash, ready for path joining.
    #[must_use]
    pub fn upstream_base(&self) -> &str {
        self.upstream_url.trim_end_matches('/')
    }

    /// Full upstream URL for an inbound path and optional query string.
    #[must_use]
    pub fn upstream_target(&self, path: &str, query: Option<&str>) -> String {
        let mut target = String::with_capacity(self.upstream_base().len() + path.len() + 1);
        target.push_str(self.upstream_base());
        if !path.starts_with('/') {
            target.push('/');
        }
        target.push_str(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let ip: IpAddr = self
            .bind_host
            .parse()
            .map_err(|_| SettingsError::InvalidBindHost(self.bind_host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub const fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// Check that the settings can be used to start the proxy.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = Url::parse(&self.upstream_url).map_err(|e| SettingsError::InvalidUpstream {
            url: self.upstream_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidUpstream {
                url: self.upstream_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(SettingsError::InvalidUpstream {
                url: self.upstream_url.clone(),
                reason: "missing host".to_string(),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(SettingsError::InvalidUpstream {
                url: self.upstream_url.clone(),
                reason: "query and fragment are not allowed in the base URL".to_string(),
            });
        }
        self.bind_addr()?;
        if self.upstream_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout("upstream"));
        }
        if self.health_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout("health"));
        }
        if self.max_request_body_bytes == 0 {
            return Err(SettingsError::ZeroBodyLimit);
        }
        Ok(())
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid upstream URL '{url}': {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("Invalid bind host '{0}': expected an IP address")]
    InvalidBindHost(String),

    #[error("The {0} timeout must be at least one second")]
    ZeroTimeout(&'static str),

    #[error("Maximum request body size must be greater than zero")]
    ZeroBodyLimit,
}
