//! Log output.
//!
//! Logs go to stderr so stdout carries only chunk output. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "mdchunk=info,mdchunk_core=info";
const VERBOSE_FILTER: &str = "mdchunk=debug,mdchunk_core=debug";

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
