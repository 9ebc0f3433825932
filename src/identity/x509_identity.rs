//! Client identity: an MSP id bound to an X.509 certificate.

use prost::Message;

use crate::error::{BridgeError, BridgeResult};
use crate::gateway::proto::SerializedIdentity;
use crate::identity::certificate::Certificate;

/// Identity presented to the gateway with every proposal.
///
/// The MSP id is opaque here; whether it matches the certificate's
/// organization is for the network to decide. A blank id is the one value
/// rejected locally, as an identity error, before any gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    msp_id: String,
    certificate: Certificate,
}

impl ClientIdentity {
    pub fn new(msp_id: &str, certificate: Certificate) -> BridgeResult<Self> {
        if msp_id.trim().is_empty() {
            return Err(BridgeError::Identity("MSP id must not be empty".to_string()));
        }

        Ok(Self {
            msp_id: msp_id.to_string(),
            certificate,
        })
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Protobuf-encoded `msp.SerializedIdentity`, used as proposal creator.
    ///
    /// `id_bytes` is the single-certificate PEM of [`Certificate::pem`], never
    /// the file the certificate was read from.
    pub fn serialize(&self) -> Vec<u8> {
        SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.certificate.pem().to_vec(),
        }
        .encode_to_vec()
    }
}
