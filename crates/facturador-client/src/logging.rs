//! # Logging
//!
//! Installs the global `tracing` subscriber.
//!
//! The default filter is `info,facturador=debug,reqwest=warn` and can be
//! overridden with `RUST_LOG`.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,facturador=debug,reqwest=warn";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes the tracing subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
    match tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Tracing subscriber already installed");
            false
        }
    }
}
