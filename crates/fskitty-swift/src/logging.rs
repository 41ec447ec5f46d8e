//! Log setup for the host process.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber writing to stderr.
///
/// `filter` uses `EnvFilter` syntax (for example `"fskitty_client=debug"`); an
/// empty or invalid filter falls back to `RUST_LOG`, then to `info`. Only the
/// first call in a process installs anything. Returns whether this call did.
pub fn init_logging(filter: String) -> bool {
    let filter = EnvFilter::try_new(filter.trim())
        .ok()
        .filter(|_| !filter.trim().is_empty())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
