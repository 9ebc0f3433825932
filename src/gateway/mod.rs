//! Fabric Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! ClientIdentity + Signer + TransportHandle
//!     → client.rs (four unary gateway.Gateway calls)
//!     → session.rs (network/contract binding, submit and evaluate flows)
//!     → proposal.rs (proposal bytes, transaction id, digests)
//!     → proto.rs (wire messages)
//! ```
//!
//! # Security Constraints
//! - Every proposal, envelope and commit-status request is signed by the
//!   session's single signer
//! - Payloads are opaque: passed through, never inspected or logged

pub mod client;
pub mod proposal;
pub mod proto;
pub mod session;

pub use client::{GatewayConnection, GrpcGatewayClient};
pub use session::{Committed, Contract, GatewaySession, Network};
