//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Verbosity comes from `RUST_LOG`, defaulting to `info`. Calling this more
/// than once is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
