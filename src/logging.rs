//! Tracing setup for the binary
//!
//! Logs go to stderr so stdout only carries command output. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::EnvFilter;

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "rainsheet=debug"
    } else {
        "rainsheet=info"
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(verbose).into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
