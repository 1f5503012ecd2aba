//! Logging setup for the command line tool
//!
//! Logs go to stderr so that GPX written to stdout stays clean.

use tracing_subscriber::prelude::*;

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// When `RUST_LOG` is not set, debug builds log at `debug` and release builds at `info`.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let default_filter = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(fmt_layer);

    if registry.try_init().is_err() {
        tracing::debug!("Logging was already initialized");
        return;
    }

    tracing::debug!("Logging initialized with default filter '{}'", default_filter);
}
