//! Structured logging.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber on request (CLI, FFI host opt-in)
//! - Resolve the filter from `RUST_LOG`, then the given default
//!
//! Installing twice is harmless: the second call reports `false` and the
//! first subscriber stays in place.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a formatted subscriber filtered by `RUST_LOG` or `default_filter`.
///
/// Returns `false` when a global subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
