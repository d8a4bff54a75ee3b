//! Tracing setup for processes that host the bridge.

use tether_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. RUST_LOG wins over the configured filter.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(config: &LoggingConfig) {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(from_env.as_deref(), &config.filter);
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Pick the filter: a parsable `from_env` first, then `configured`, then `info`.
fn resolve_filter(from_env: Option<&str>, configured: &str) -> EnvFilter {
    if let Some(directives) = from_env.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("invalid {} {directives:?}: {e}", EnvFilter::DEFAULT_ENV),
        }
    }
    EnvFilter::try_new(configured).unwrap_or_else(|e| {
        eprintln!("invalid log filter {configured:?}: {e}, falling back to info");
        EnvFilter::new("info")
    })
}
