//! Transport handle: one TLS channel to one gateway peer.
//!
//! # Responsibilities
//! - Turn a peer address into an `https` endpoint
//! - Attach the pinned TLS configuration and the connect deadline
//! - Own the channel for the duration of one call and close it exactly once
//!
//! # Design Decisions
//! - The channel is lazy: no TCP or TLS traffic happens until the first
//!   gateway call, so handshake and trust failures surface there
//! - Plaintext endpoints are refused; the trust anchor is mandatory

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::{BridgeError, BridgeResult};
use crate::identity::Certificate;
use crate::net::tls::pinned_tls_config;

/// Lifecycle state of a transport handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Channel configured; handshake happens on first use.
    Open,
    /// Channel released.
    Closed,
}

/// An established, trust-pinned channel to one gateway endpoint.
#[derive(Debug)]
pub struct TransportHandle {
    channel: Option<Channel>,
    endpoint: String,
    server_name: String,
}

impl TransportHandle {
    /// Build a channel to `peer_endpoint`, trusting only `trust_anchor` and
    /// expecting the peer to present `server_name`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(
        trust_anchor: &Certificate,
        peer_endpoint: &str,
        server_name: &str,
        connect_timeout: Duration,
    ) -> BridgeResult<Self> {
        let uri = endpoint_uri(peer_endpoint)?;
        let tls = pinned_tls_config(trust_anchor, server_name)?;

        let endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| BridgeError::Connection(format!("Invalid endpoint '{}': {}", uri, e)))?
            .tls_config(tls)
            .map_err(|e| BridgeError::Connection(format!("TLS configuration rejected: {}", e)))?
            .connect_timeout(connect_timeout)
            .tcp_nodelay(true);

        let channel = endpoint.connect_lazy();

        tracing::debug!(
            endpoint = %uri,
            server_name = %server_name,
            trust_anchor = %trust_anchor.subject(),
            "Transport configured"
        );

        Ok(Self {
            channel: Some(channel),
            endpoint: uri,
            server_name: server_name.to_string(),
        })
    }

    /// A handle onto the underlying channel for issuing calls.
    pub fn channel(&self) -> BridgeResult<Channel> {
        self.channel
            .clone()
            .ok_or_else(|| BridgeError::Connection("Transport already closed".to_string()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn state(&self) -> TransportState {
        if self.channel.is_some() {
            TransportState::Open
        } else {
            TransportState::Closed
        }
    }

    /// Release the channel. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.channel.take().is_some() {
            tracing::debug!(endpoint = %self.endpoint, "Transport closed");
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Normalize a peer address (`host:port` or `https://host:port`) to a URI.
fn endpoint_uri(peer_endpoint: &str) -> BridgeResult<String> {
    let trimmed = peer_endpoint.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::Connection(
            "Peer endpoint must not be empty".to_string(),
        ));
    }

    match trimmed.split_once("://") {
        None => Ok(format!("https://{}", trimmed)),
        Some(("https", _)) => Ok(trimmed.to_string()),
        Some((scheme, _)) => Err(BridgeError::Connection(format!(
            "Unsupported endpoint scheme '{}', only TLS (https) is allowed",
            scheme
        ))),
    }
}
