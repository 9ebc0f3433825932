//! Gateway RPC client.
//!
//! # Responsibilities
//! - Issue the four unary `gateway.Gateway` calls over a tonic channel
//! - Propagate the per-call deadline to the peer (`grpc-timeout`)
//! - Leave deadline enforcement and error classification to the session
//!
//! The [`GatewayConnection`] trait is the seam between the session logic and
//! the wire, so the session can be driven by an in-process fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::gateway::proto::{
    CommitStatusResponse, EndorseRequest, EndorseResponse, EvaluateRequest, EvaluateResponse,
    SignedCommitStatusRequest, SubmitRequest, SubmitResponse,
};

const ENDORSE_PATH: &str = "/gateway.Gateway/Endorse";
const SUBMIT_PATH: &str = "/gateway.Gateway/Submit";
const COMMIT_STATUS_PATH: &str = "/gateway.Gateway/CommitStatus";
const EVALUATE_PATH: &str = "/gateway.Gateway/Evaluate";

/// The gateway calls a session needs.
#[async_trait]
pub trait GatewayConnection: Send {
    async fn endorse(
        &mut self,
        request: EndorseRequest,
        deadline: Duration,
    ) -> Result<EndorseResponse, Status>;

    async fn submit(
        &mut self,
        request: SubmitRequest,
        deadline: Duration,
    ) -> Result<SubmitResponse, Status>;

    async fn commit_status(
        &mut self,
        request: SignedCommitStatusRequest,
        deadline: Duration,
    ) -> Result<CommitStatusResponse, Status>;

    async fn evaluate(
        &mut self,
        request: EvaluateRequest,
        deadline: Duration,
    ) -> Result<EvaluateResponse, Status>;
}

/// tonic-backed gateway client over one channel.
#[derive(Debug, Clone)]
pub struct GrpcGatewayClient {
    inner: Grpc<Channel>,
}

impl GrpcGatewayClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(
        &mut self,
        message: Req,
        path: &'static str,
        deadline: Duration,
    ) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("Service was not ready: {}", e)))?;

        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        let mut request = Request::new(message);
        request.set_timeout(deadline);

        let response = self
            .inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl GatewayConnection for GrpcGatewayClient {
    async fn endorse(
        &mut self,
        request: EndorseRequest,
        deadline: Duration,
    ) -> Result<EndorseResponse, Status> {
        self.unary(request, ENDORSE_PATH, deadline).await
    }

    async fn submit(
        &mut self,
        request: SubmitRequest,
        deadline: Duration,
    ) -> Result<SubmitResponse, Status> {
        self.unary(request, SUBMIT_PATH, deadline).await
    }

    async fn commit_status(
        &mut self,
        request: SignedCommitStatusRequest,
        deadline: Duration,
    ) -> Result<CommitStatusResponse, Status> {
        self.unary(request, COMMIT_STATUS_PATH, deadline).await
    }

    async fn evaluate(
        &mut self,
        request: EvaluateRequest,
        deadline: Duration,
    ) -> Result<EvaluateResponse, Status> {
        self.unary(request, EVALUATE_PATH, deadline).await
    }
}
