//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the bridge CLI and the
//! key-value client. All types derive Serde traits for deserialization from
//! config files. The exported C entry points take their connection details as
//! arguments and only use [`GatewayTimeouts::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult, GatewayPhase};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Gateway peer, channel, contract and identity material.
    pub connection: ConnectionProfile,

    /// Per-call deadlines.
    pub timeouts: GatewayTimeouts,

    /// Private key selection policy.
    pub keys: KeyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Everything needed to reach one contract through one gateway peer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionProfile {
    /// Channel (network) name.
    pub channel_name: String,

    /// Chaincode (contract) name deployed on the channel.
    pub contract_name: String,

    /// Membership service provider id of the client organization.
    pub msp_id: String,

    /// Path to the client certificate (PEM). A leading `~` is expanded.
    pub cert_path: String,

    /// Directory holding the client private key (PEM).
    pub key_path: String,

    /// Path to the CA certificate the gateway peer's TLS certificate chains to.
    pub tls_cert_path: String,

    /// Gateway peer address, e.g. `localhost:7051`.
    pub peer_endpoint: String,

    /// Expected TLS server name of the gateway peer.
    pub gateway_peer: String,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            channel_name: "mychannel".to_string(),
            contract_name: "basic".to_string(),
            msp_id: "Org1MSP".to_string(),
            cert_path: String::new(),
            key_path: String::new(),
            tls_cert_path: String::new(),
            peer_endpoint: "localhost:7051".to_string(),
            gateway_peer: "peer0.org1.example.com".to_string(),
        }
    }
}

/// Connection string fields as emitted by hosts that configure the bridge
/// with a single JSON document.
#[derive(Debug, Deserialize)]
struct ConnectionString {
    channel_name: String,
    #[serde(default)]
    contract_name: Option<String>,
    msp_id: String,
    cert_path: String,
    key_path: String,
    tls_cert_path: String,
    peer_endpoint: String,
    gateway_peer: String,
}

impl ConnectionProfile {
    /// Build a profile from a JSON connection string.
    ///
    /// Unknown keys (such as `peer_port` or `test_network_path`) are ignored.
    /// A missing `contract_name` keeps the default.
    pub fn from_connection_string(json: &str) -> BridgeResult<Self> {
        let parsed: ConnectionString = serde_json::from_str(json)
            .map_err(|e| BridgeError::InvalidInput(format!("Invalid connection string: {}", e)))?;

        let defaults = Self::default();
        Ok(Self {
            channel_name: parsed.channel_name,
            contract_name: parsed.contract_name.unwrap_or(defaults.contract_name),
            msp_id: parsed.msp_id,
            cert_path: parsed.cert_path,
            key_path: parsed.key_path,
            tls_cert_path: parsed.tls_cert_path,
            peer_endpoint: parsed.peer_endpoint,
            gateway_peer: parsed.gateway_peer,
        })
    }
}

/// Deadlines for the gateway calls, in seconds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayTimeouts {
    /// Read-only query.
    pub evaluate_secs: u64,

    /// Endorsement of a write proposal.
    pub endorse_secs: u64,

    /// Hand-off to ordering.
    pub submit_secs: u64,

    /// Wait for commit confirmation.
    pub commit_status_secs: u64,

    /// TCP/TLS connection establishment.
    pub connect_secs: u64,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            evaluate_secs: 5,
            endorse_secs: 15,
            submit_secs: 5,
            commit_status_secs: 60,
            connect_secs: 10,
        }
    }
}

impl GatewayTimeouts {
    /// Deadline for one gateway call kind.
    pub fn for_phase(&self, phase: GatewayPhase) -> Duration {
        let secs = match phase {
            GatewayPhase::Evaluate => self.evaluate_secs,
            GatewayPhase::Endorse => self.endorse_secs,
            GatewayPhase::Submit => self.submit_secs,
            GatewayPhase::CommitStatus => self.commit_status_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

/// Private key selection policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct KeyConfig {
    /// Fail when the key directory holds more than one file instead of
    /// picking the first one by name.
    pub strict: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full
    /// `EnvFilter` expression).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = GatewayTimeouts::default();
        assert_eq!(timeouts.for_phase(GatewayPhase::Evaluate), Duration::from_secs(5));
        assert_eq!(timeouts.for_phase(GatewayPhase::Endorse), Duration::from_secs(15));
        assert_eq!(timeouts.for_phase(GatewayPhase::Submit), Duration::from_secs(5));
        assert_eq!(
            timeouts.for_phase(GatewayPhase::CommitStatus),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_connection_string() {
        let json = r#"{
            "channel_name": "ledgerchannel",
            "peer_port": "9051",
            "msp_id": "Org2MSP",
            "cert_path": "~/org2/cert.pem",
            "key_path": "~/org2/keystore",
            "tls_cert_path": "~/org2/ca.crt",
            "gateway_peer": "peer0.org2.example.com",
            "peer_endpoint": "localhost:9051",
            "test_network_path": "/opt/fabric"
        }"#;
        let profile = ConnectionProfile::from_connection_string(json).unwrap();
        assert_eq!(profile.channel_name, "ledgerchannel");
        assert_eq!(profile.msp_id, "Org2MSP");
        assert_eq!(profile.contract_name, "basic");
        assert_eq!(profile.peer_endpoint, "localhost:9051");
    }

    #[test]
    fn test_connection_string_missing_field() {
        let result = ConnectionProfile::from_connection_string(r#"{"channel_name": "c"}"#);
        assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [timeouts]
            evaluate_secs = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.evaluate_secs, 2);
        assert_eq!(config.timeouts.commit_status_secs, 60);
        assert!(!config.keys.strict);
        assert_eq!(config.connection.channel_name, "mychannel");
    }
}
