//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set.
///
/// Debug mode also enables the filter's `trace` output, which carries the
/// text of each removed span.
pub const fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug,thinkstrip_core::filter=trace"
    } else {
        "info"
    }
}

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the debug toggle.
/// A second call is a no-op.
pub fn init(debug: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .try_init()
        .ok();
}
