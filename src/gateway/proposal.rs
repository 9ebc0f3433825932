//! Proposal construction and transaction ids.
//!
//! # Responsibilities
//! - Build the signed-proposal payload for one chaincode invocation
//! - Derive the transaction id from a fresh nonce and the creator identity
//! - Hash messages for the signer
//!
//! The invocation arguments are the function name followed by the payload,
//! passed through byte for byte.

use std::time::SystemTime;

use prost::Message;
use prost_types::Timestamp;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::gateway::proto::{
    ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, ChaincodeSpec, ChannelHeader, Header, Proposal, SignatureHeader,
    HEADER_TYPE_ENDORSER_TRANSACTION,
};

/// Nonce length used by Fabric clients.
pub const NONCE_LENGTH: usize = 24;

/// An unsigned proposal ready to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedProposal {
    pub transaction_id: String,
    pub proposal_bytes: Vec<u8>,
}

/// SHA-256 digest of a message, which is what the signer signs.
pub fn digest(message: &[u8]) -> Vec<u8> {
    Sha256::digest(message).to_vec()
}

/// Transaction id: hex-encoded SHA-256 of nonce || creator.
pub fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

fn new_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Build a proposal invoking `function(args...)` on `chaincode` in `channel`.
pub fn build_proposal(
    creator: &[u8],
    channel: &str,
    chaincode: &str,
    function: &str,
    args: &[&[u8]],
) -> PreparedProposal {
    let nonce = new_nonce();
    let tx_id = transaction_id(&nonce, creator);

    let chaincode_id = ChaincodeId {
        name: chaincode.to_string(),
        ..Default::default()
    };

    let channel_header = ChannelHeader {
        r#type: HEADER_TYPE_ENDORSER_TRANSACTION,
        timestamp: Some(Timestamp::from(SystemTime::now())),
        channel_id: channel.to_string(),
        tx_id: tx_id.clone(),
        extension: ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id.clone()),
        }
        .encode_to_vec(),
        ..Default::default()
    };

    let signature_header = SignatureHeader {
        creator: creator.to_vec(),
        nonce,
    };

    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    let mut invocation_args = Vec::with_capacity(args.len() + 1);
    invocation_args.push(function.as_bytes().to_vec());
    invocation_args.extend(args.iter().map(|arg| arg.to_vec()));

    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            chaincode_id: Some(chaincode_id),
            input: Some(ChaincodeInput {
                args: invocation_args,
                is_init: false,
            }),
            ..Default::default()
        }),
    };

    let payload = ChaincodeProposalPayload {
        input: invocation.encode_to_vec(),
    };

    let proposal = Proposal {
        header: header.encode_to_vec(),
        payload: payload.encode_to_vec(),
        extension: Vec::new(),
    };

    PreparedProposal {
        transaction_id: tx_id,
        proposal_bytes: proposal.encode_to_vec(),
    }
}
