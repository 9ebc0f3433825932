//! Error taxonomy shared by every layer of the bridge.
//!
//! Errors carry enough context to say which phase failed. At the foreign
//! boundary every error collapses to [`STATUS_FAILURE`]; the detail only
//! reaches the logs.

use std::path::PathBuf;

use thiserror::Error;

/// Boundary status code for a successful call.
pub const STATUS_SUCCESS: i32 = 0;

/// Boundary status code for any failed call.
pub const STATUS_FAILURE: i32 = 1;

/// Gateway call kinds, each with its own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayPhase {
    /// Read-only query against a single peer.
    Evaluate,
    /// Proposal endorsement for a write.
    Endorse,
    /// Hand-off of the endorsed transaction to ordering.
    Submit,
    /// Wait for the commit outcome of a submitted transaction.
    CommitStatus,
}

impl GatewayPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayPhase::Evaluate => "evaluate",
            GatewayPhase::Endorse => "endorse",
            GatewayPhase::Submit => "submit",
            GatewayPhase::CommitStatus => "commit_status",
        }
    }
}

impl std::fmt::Display for GatewayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while bridging a call to the ledger gateway.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A file or directory could not be read.
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PEM, certificate or key content is malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The key directory holds no usable entry.
    #[error("No private key found in {0:?}")]
    NoKeyFound(PathBuf),

    /// The key directory holds more than one candidate and strict selection is on.
    #[error("Ambiguous key directory {path:?}: {count} candidate files")]
    AmbiguousKey { path: PathBuf, count: usize },

    /// Channel construction or handshake failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The client identity could not be built.
    #[error("Identity error: {0}")]
    Identity(String),

    /// A gateway call exceeded its deadline.
    #[error("{phase} timed out after {after_secs} seconds")]
    Timeout { phase: GatewayPhase, after_secs: u64 },

    /// The gateway or the contract rejected the request.
    #[error("{phase} rejected by gateway: {message}")]
    Remote { phase: GatewayPhase, message: String },

    /// Caller-supplied input is unusable (null pointer, bad UTF-8, empty name).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Io { .. } => "io",
            BridgeError::Parse(_) => "parse",
            BridgeError::NoKeyFound(_) => "no_key_found",
            BridgeError::AmbiguousKey { .. } => "ambiguous_key",
            BridgeError::Connection(_) => "connection",
            BridgeError::Identity(_) => "identity",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::Remote { .. } => "remote",
            BridgeError::InvalidInput(_) => "invalid_input",
        }
    }

    /// Status code reported across the foreign boundary.
    pub fn status_code(&self) -> i32 {
        STATUS_FAILURE
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
