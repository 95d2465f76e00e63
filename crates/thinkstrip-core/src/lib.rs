//! # thinkstrip-core
//!
//! Pure domain logic for the thinkstrip proxy, with no HTTP or runtime
//! dependencies:
//!
//! - [`filter`] - streaming removal of `<think>` spans in literal and
//!   JSON-escaped form
//! - [`utf8`] - chunk-boundary-safe UTF-8 decoding of upstream bytes
//! - [`request`] - the per-request streaming decision
//! - [`settings`] - proxy settings and their validation

#![deny(unused_crate_dependencies)]

pub mod filter;
pub mod request;
pub mod settings;
pub mod utf8;

pub use filter::{DelimiterForm, LOOKBACK_WINDOW, ThinkTagFilter};
pub use request::StreamDecision;
pub use settings::{
    DEFAULT_BIND_HOST, DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_MAX_REQUEST_BODY_BYTES,
    DEFAULT_PROXY_PORT, DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL, ProxySettings,
    SettingsError,
};
pub use utf8::Utf8ChunkDecoder;
