//! Ledger Bridge Library
//!
//! Submits and evaluates Hyperledger Fabric transactions through a gateway
//! peer on behalf of a host process, over a C ABI or directly from Rust.
//!
//! # Architecture Overview
//!
//! ```text
//!   host process
//!        │  ledger_bridge_write / ledger_bridge_read
//!        ▼
//!   ┌─────────┐     ┌─────────┐     ┌────────────────────────────────┐
//!   │   ffi   │────▶│ bridge  │────▶│ net (pinned TLS transport)      │
//!   └─────────┘     │ per-call│     │ identity (cert, key, MSP id)    │
//!   ┌─────────┐     │ runtime │     │ gateway (session, proposals)    │──▶ gateway peer
//!   │   kv    │────▶│         │     └────────────────────────────────┘
//!   └─────────┘     └─────────┘
//!
//!   cross-cutting: config, error, observability
//! ```
//!
//! Every call builds and tears down its own runtime, channel and session.
//! There is no process-wide state apart from an optional log subscriber.

pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod gateway;
pub mod identity;
pub mod kv;
pub mod net;
pub mod observability;

pub use bridge::CallParams;
pub use config::{BridgeConfig, ConnectionProfile, GatewayTimeouts};
pub use error::{BridgeError, BridgeResult, GatewayPhase};
pub use gateway::Committed;
pub use kv::LedgerKvClient;
