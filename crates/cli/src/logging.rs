// Logging setup: tracing-subscriber on stderr, filtered by RUST_LOG.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Defaults to `warn` when `RUST_LOG` is unset
/// or invalid; `verbose` raises the default to `info`.
///
/// stdout is reserved for reports, so everything goes to stderr.
pub fn init(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
