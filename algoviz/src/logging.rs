//! Tracing setup shared by the library's binaries and tests.
//!
//! Diagnostics go to stderr and are filtered by `RUST_LOG`. Execution steps
//! are product output and travel through the hub, never through tracing.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; falls back to `default_directive` when it is unset or
/// invalid. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=algoviz=debug,algoviz_server=debug algoviz-server
/// ```
pub fn init(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

/// Default filter for the server given its `debug` setting.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "algoviz=debug,algoviz_server=debug,tower_http=debug"
    } else {
        "algoviz=info,algoviz_server=info"
    }
}
