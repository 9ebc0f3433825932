//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every boundary call produces:
//!     → logging.rs (structured events: phase, endpoint, tx id, outcome)
//!     → metrics.rs (call counters and latency histograms)
//!
//! Consumers:
//!     → Whatever tracing subscriber the host installs (or ours via init_logging)
//!     → Whatever metrics recorder the host installs (no-op otherwise)
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber on its own
//! - Key material and payload contents are never logged, only sizes

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
