//! Per-call orchestration behind the exported entry points.
//!
//! Every call owns everything it touches: a current-thread runtime, one
//! transport, one session. The steps run in a fixed order
//!
//! ```text
//! connect → identity → signer → session-open → resolve → operate → close
//! ```
//!
//! and all of it is dropped before the call returns, on success and on
//! failure alike. Nothing is cached between calls.

use std::time::Instant;

use tokio::runtime::{Builder, Runtime};

use crate::config::{ConnectionProfile, GatewayTimeouts};
use crate::error::{BridgeError, BridgeResult};
use crate::gateway::{Committed, GatewaySession, GrpcGatewayClient};
use crate::identity::{load_certificate, load_signer, ClientIdentity};
use crate::net::TransportHandle;
use crate::observability::metrics::{self, Operation};

/// The arguments of one boundary call.
#[derive(Debug, Clone, Copy)]
pub struct CallParams<'a> {
    pub payload: &'a [u8],
    pub function: &'a str,
    pub network: &'a str,
    pub contract: &'a str,
    pub msp_id: &'a str,
    pub cert_path: &'a str,
    pub key_dir: &'a str,
    pub trust_anchor_path: &'a str,
    pub peer_endpoint: &'a str,
    pub peer_name: &'a str,
}

impl<'a> CallParams<'a> {
    /// Call `function(payload)` against the target described by `profile`.
    pub fn from_profile(
        profile: &'a ConnectionProfile,
        function: &'a str,
        payload: &'a [u8],
    ) -> Self {
        Self {
            payload,
            function,
            network: &profile.channel_name,
            contract: &profile.contract_name,
            msp_id: &profile.msp_id,
            cert_path: &profile.cert_path,
            key_dir: &profile.key_path,
            trust_anchor_path: &profile.tls_cert_path,
            peer_endpoint: &profile.peer_endpoint,
            peer_name: &profile.gateway_peer,
        }
    }
}

/// Submit a transaction and wait for it to commit.
pub fn write(
    params: &CallParams<'_>,
    timeouts: &GatewayTimeouts,
    strict_keys: bool,
) -> BridgeResult<Committed> {
    let start = Instant::now();
    let result = runtime().and_then(|rt| {
        rt.block_on(async {
            let (mut transport, mut session) = open(params, timeouts, strict_keys)?;
            let result = async {
                let contract = session.network(params.network)?.contract(params.contract)?;
                contract.submit(params.function, params.payload).await
            }
            .await;
            session.close();
            transport.close();
            result
        })
    });

    metrics::record_call(Operation::Write, &result, start);
    log_outcome(Operation::Write, params, &result);
    result
}

/// Evaluate a query and return the peer's response payload.
pub fn read(
    params: &CallParams<'_>,
    timeouts: &GatewayTimeouts,
    strict_keys: bool,
) -> BridgeResult<Vec<u8>> {
    let start = Instant::now();
    let result = runtime().and_then(|rt| {
        rt.block_on(async {
            let (mut transport, mut session) = open(params, timeouts, strict_keys)?;
            let result = async {
                let contract = session.network(params.network)?.contract(params.contract)?;
                contract.evaluate(params.function, params.payload).await
            }
            .await;
            session.close();
            transport.close();
            result
        })
    });

    metrics::record_call(Operation::Read, &result, start);
    log_outcome(Operation::Read, params, &result);
    result
}

fn runtime() -> BridgeResult<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Connection(format!("Failed to build async runtime: {}", e)))
}

/// Steps connect through session-open. Must run inside the call's runtime.
fn open(
    params: &CallParams<'_>,
    timeouts: &GatewayTimeouts,
    strict_keys: bool,
) -> BridgeResult<(TransportHandle, GatewaySession<GrpcGatewayClient>)> {
    // 1. Transport, pinned to the trust anchor
    let trust_anchor = load_certificate(params.trust_anchor_path)?;
    let transport = TransportHandle::connect(
        &trust_anchor,
        params.peer_endpoint,
        params.peer_name,
        timeouts.connect(),
    )?;

    // 2. Identity
    let certificate = load_certificate(params.cert_path)?;
    let identity = ClientIdentity::new(params.msp_id, certificate)?;

    // 3. Signer
    let signer = load_signer(params.key_dir, strict_keys)?;

    // 4. Session
    let client = GrpcGatewayClient::new(transport.channel()?);
    let session = GatewaySession::open(identity, Box::new(signer), client, *timeouts);

    tracing::debug!(
        endpoint = %transport.endpoint(),
        msp_id = %params.msp_id,
        "Bridge call ready"
    );

    Ok((transport, session))
}

fn log_outcome<T>(operation: Operation, params: &CallParams<'_>, result: &BridgeResult<T>) {
    match result {
        Ok(_) => tracing::debug!(
            operation = operation.as_str(),
            function = %params.function,
            channel = %params.network,
            contract = %params.contract,
            "Bridge call succeeded"
        ),
        Err(e) => tracing::error!(
            operation = operation.as_str(),
            function = %params.function,
            channel = %params.network,
            contract = %params.contract,
            kind = e.kind(),
            error = %e,
            "Bridge call failed"
        ),
    }
}
