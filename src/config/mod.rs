//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or JSON connection string
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → passed by reference into each bridge call
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Nothing is cached between calls; each call reads its key material fresh

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BridgeConfig;
pub use schema::ConnectionProfile;
pub use schema::GatewayTimeouts;
pub use schema::KeyConfig;
pub use loader::{load_config, parse_config, ConfigError};
