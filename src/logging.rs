//! Logging bootstrap.
//!
//! The library only emits `tracing` events. Binaries, demos and tests that
//! want to see them call [`init_logging`] once; `RUST_LOG` takes precedence
//! over the fallback directive.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset
#[cfg(not(feature = "verbose-logging"))]
pub const DEFAULT_LOG_FILTER: &str = "info,sweet_crypto=debug";

/// Directive used when `RUST_LOG` is unset
#[cfg(feature = "verbose-logging")]
pub const DEFAULT_LOG_FILTER: &str = "debug,sweet_crypto=trace";

/// Install a fmt subscriber filtered by `RUST_LOG` or [`DEFAULT_LOG_FILTER`]
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one is left in place.
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_LOG_FILTER)
}

/// [`init_logging`] with a caller-chosen fallback directive
pub fn init_logging_with(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .try_init()
        .is_ok()
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}
