//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! trust anchor + peer endpoint + expected server name
//!     → tls.rs (pinned single-CA client config)
//!     → transport.rs (lazy channel, owned by one call)
//!     → Hand off to the gateway session
//!
//! Transport States:
//!     Open → Closed
//! ```
//!
//! # Design Decisions
//! - One channel per call; reuse across calls would need an explicit pool
//! - No fallback to the system trust store

pub mod tls;
pub mod transport;

pub use transport::{TransportHandle, TransportState};
