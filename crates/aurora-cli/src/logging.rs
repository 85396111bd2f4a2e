//! Log setup for the `aurora` binary.
//!
//! Logs go to stderr so command output on stdout stays pipeable JSON.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Filter from a `RUST_LOG`-style directive, falling back to `info` when it
/// is unset or invalid.
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init() {
    let directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}
