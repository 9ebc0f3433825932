//! Gateway session: network and contract binding plus the two transaction
//! flows.
//!
//! # Data Flow
//! ```text
//! submit:   proposal → sign → Endorse ─┐
//!           sign envelope ← ───────────┘
//!           → Submit → signed CommitStatus → VALID?
//! evaluate: proposal → sign → Evaluate → response payload
//! ```
//!
//! Every gateway call runs under its own deadline from [`GatewayTimeouts`].
//! Nothing is retried here.

use std::future::Future;
use std::time::Duration;

use prost::Message;
use tokio::time::timeout;
use tonic::{Code, Status};

use crate::config::GatewayTimeouts;
use crate::error::{BridgeError, BridgeResult, GatewayPhase};
use crate::gateway::client::GatewayConnection;
use crate::gateway::proposal::{build_proposal, digest, PreparedProposal};
use crate::gateway::proto::{
    CommitStatusRequest, EndorseRequest, EvaluateRequest, SignedCommitStatusRequest,
    SignedProposal, SubmitRequest, TX_VALIDATION_CODE_VALID,
};
use crate::identity::{ClientIdentity, Signer};

/// Peer response statuses at or above this value are errors.
const PEER_ERROR_THRESHOLD: i32 = 400;

/// Outcome of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub transaction_id: String,
    pub block_number: u64,
}

/// An authenticated session with one gateway peer.
pub struct GatewaySession<C: GatewayConnection> {
    connection: Option<C>,
    identity: ClientIdentity,
    creator: Vec<u8>,
    signer: Box<dyn Signer>,
    timeouts: GatewayTimeouts,
}

impl<C: GatewayConnection> GatewaySession<C> {
    /// Open a session for `identity`, signing with `signer`.
    pub fn open(
        identity: ClientIdentity,
        signer: Box<dyn Signer>,
        connection: C,
        timeouts: GatewayTimeouts,
    ) -> Self {
        tracing::debug!(msp_id = %identity.msp_id(), "Gateway session opened");
        Self {
            creator: identity.serialize(),
            connection: Some(connection),
            identity,
            signer,
            timeouts,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn timeouts(&self) -> &GatewayTimeouts {
        &self.timeouts
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Bind a network (channel) by name. No network traffic.
    pub fn network(&mut self, name: &str) -> BridgeResult<Network<'_, C>> {
        if name.trim().is_empty() {
            return Err(BridgeError::InvalidInput(
                "Network name must not be empty".to_string(),
            ));
        }
        Ok(Network {
            session: self,
            name: name.to_string(),
        })
    }

    /// Close the session. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            tracing::debug!(msp_id = %self.identity.msp_id(), "Gateway session closed");
        }
    }

    fn connection(&mut self) -> BridgeResult<&mut C> {
        self.connection
            .as_mut()
            .ok_or_else(|| BridgeError::Connection("Gateway session already closed".to_string()))
    }

    fn sign(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
        self.signer.sign(&digest(message))
    }

    fn signed_proposal(
        &self,
        channel: &str,
        chaincode: &str,
        function: &str,
        payload: &[u8],
    ) -> BridgeResult<(PreparedProposal, SignedProposal)> {
        let prepared = build_proposal(&self.creator, channel, chaincode, function, &[payload]);
        let signature = self.sign(&prepared.proposal_bytes)?;
        let signed = SignedProposal {
            proposal_bytes: prepared.proposal_bytes.clone(),
            signature,
        };
        Ok((prepared, signed))
    }

    async fn submit_transaction(
        &mut self,
        channel: &str,
        chaincode: &str,
        function: &str,
        payload: &[u8],
    ) -> BridgeResult<Committed> {
        let (prepared, signed) = self.signed_proposal(channel, chaincode, function, payload)?;
        let tx_id = prepared.transaction_id;

        tracing::info!(
            transaction_id = %tx_id,
            channel = %channel,
            contract = %chaincode,
            function = %function,
            payload_len = payload.len(),
            "Endorsing transaction"
        );

        let endorse_deadline = self.timeouts.for_phase(GatewayPhase::Endorse);
        let request = EndorseRequest {
            transaction_id: tx_id.clone(),
            channel_id: channel.to_string(),
            proposed_transaction: Some(signed),
            endorsing_organizations: Vec::new(),
        };
        let connection = self.connection()?;
        let endorsed = with_deadline(
            GatewayPhase::Endorse,
            endorse_deadline,
            connection.endorse(request, endorse_deadline),
        )
        .await?;

        let mut envelope = endorsed.prepared_transaction.ok_or_else(|| BridgeError::Remote {
            phase: GatewayPhase::Endorse,
            message: "Gateway returned no prepared transaction".to_string(),
        })?;
        envelope.signature = self.sign(&envelope.payload)?;

        tracing::debug!(transaction_id = %tx_id, "Submitting endorsed transaction");

        let submit_deadline = self.timeouts.for_phase(GatewayPhase::Submit);
        let request = SubmitRequest {
            transaction_id: tx_id.clone(),
            channel_id: channel.to_string(),
            prepared_transaction: Some(envelope),
        };
        let connection = self.connection()?;
        with_deadline(
            GatewayPhase::Submit,
            submit_deadline,
            connection.submit(request, submit_deadline),
        )
        .await?;

        let status_request = CommitStatusRequest {
            transaction_id: tx_id.clone(),
            channel_id: channel.to_string(),
            identity: self.creator.clone(),
        }
        .encode_to_vec();
        let signature = self.sign(&status_request)?;

        let commit_deadline = self.timeouts.for_phase(GatewayPhase::CommitStatus);
        let request = SignedCommitStatusRequest {
            request: status_request,
            signature,
        };
        let connection = self.connection()?;
        let status = with_deadline(
            GatewayPhase::CommitStatus,
            commit_deadline,
            connection.commit_status(request, commit_deadline),
        )
        .await
        .inspect_err(|e| {
            if matches!(e, BridgeError::Timeout { .. }) {
                // The transaction was already handed to ordering and may
                // still commit; the caller only sees a failure.
                tracing::warn!(
                    transaction_id = %tx_id,
                    "Commit status unknown after submit; ledger state may have changed"
                );
            }
        })?;

        if status.result != TX_VALIDATION_CODE_VALID {
            return Err(BridgeError::Remote {
                phase: GatewayPhase::CommitStatus,
                message: format!(
                    "Transaction {} failed to commit with validation code {}",
                    tx_id, status.result
                ),
            });
        }

        tracing::info!(
            transaction_id = %tx_id,
            block_number = status.block_number,
            "Transaction committed"
        );

        Ok(Committed {
            transaction_id: tx_id,
            block_number: status.block_number,
        })
    }

    async fn evaluate_transaction(
        &mut self,
        channel: &str,
        chaincode: &str,
        function: &str,
        payload: &[u8],
    ) -> BridgeResult<Vec<u8>> {
        let (prepared, signed) = self.signed_proposal(channel, chaincode, function, payload)?;

        tracing::info!(
            transaction_id = %prepared.transaction_id,
            channel = %channel,
            contract = %chaincode,
            function = %function,
            payload_len = payload.len(),
            "Evaluating transaction"
        );

        let deadline = self.timeouts.for_phase(GatewayPhase::Evaluate);
        let request = EvaluateRequest {
            transaction_id: prepared.transaction_id,
            channel_id: channel.to_string(),
            proposed_transaction: Some(signed),
            target_organizations: Vec::new(),
        };
        let connection = self.connection()?;
        let response = with_deadline(
            GatewayPhase::Evaluate,
            deadline,
            connection.evaluate(request, deadline),
        )
        .await?;

        let result = response.result.ok_or_else(|| BridgeError::Remote {
            phase: GatewayPhase::Evaluate,
            message: "Gateway returned no result".to_string(),
        })?;

        if result.status >= PEER_ERROR_THRESHOLD {
            return Err(BridgeError::Remote {
                phase: GatewayPhase::Evaluate,
                message: format!("Peer returned status {}: {}", result.status, result.message),
            });
        }

        Ok(result.payload)
    }
}

impl<C: GatewayConnection> Drop for GatewaySession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: GatewayConnection> std::fmt::Debug for GatewaySession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySession")
            .field("msp_id", &self.identity.msp_id())
            .field("open", &self.is_open())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

/// A channel bound within a session.
pub struct Network<'a, C: GatewayConnection> {
    session: &'a mut GatewaySession<C>,
    name: String,
}

impl<'a, C: GatewayConnection> Network<'a, C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind a contract (chaincode) by name. No network traffic.
    pub fn contract(self, name: &str) -> BridgeResult<Contract<'a, C>> {
        if name.trim().is_empty() {
            return Err(BridgeError::InvalidInput(
                "Contract name must not be empty".to_string(),
            ));
        }
        Ok(Contract {
            session: self.session,
            channel: self.name,
            chaincode: name.to_string(),
        })
    }
}

/// A contract bound within a network. Serves a single request.
pub struct Contract<'a, C: GatewayConnection> {
    session: &'a mut GatewaySession<C>,
    channel: String,
    chaincode: String,
}

impl<'a, C: GatewayConnection> Contract<'a, C> {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn name(&self) -> &str {
        &self.chaincode
    }

    /// Endorse, order and commit `function(payload)`.
    pub async fn submit(self, function: &str, payload: &[u8]) -> BridgeResult<Committed> {
        self.session
            .submit_transaction(&self.channel, &self.chaincode, function, payload)
            .await
    }

    /// Query `function(payload)` on one peer and return its payload verbatim.
    pub async fn evaluate(self, function: &str, payload: &[u8]) -> BridgeResult<Vec<u8>> {
        self.session
            .evaluate_transaction(&self.channel, &self.chaincode, function, payload)
            .await
    }
}

/// Run one gateway call under `deadline` and classify its failure.
async fn with_deadline<T, F>(phase: GatewayPhase, deadline: Duration, call: F) -> BridgeResult<T>
where
    F: Future<Output = Result<T, Status>>,
{
    match timeout(deadline, call).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(status)) => Err(classify_status(phase, deadline, status)),
        Err(_) => Err(BridgeError::Timeout {
            phase,
            after_secs: deadline.as_secs(),
        }),
    }
}

fn classify_status(phase: GatewayPhase, deadline: Duration, status: Status) -> BridgeError {
    match status.code() {
        Code::DeadlineExceeded => BridgeError::Timeout {
            phase,
            after_secs: deadline.as_secs(),
        },
        Code::Unavailable | Code::Cancelled => BridgeError::Connection(format!(
            "{} failed: {}",
            phase,
            status.message()
        )),
        code => BridgeError::Remote {
            phase,
            message: format!("{:?}: {}", code, status.message()),
        },
    }
}
