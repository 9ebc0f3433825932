//! In-process TLS `gateway.Gateway` peer.
//!
//! Serves the four unary gateway calls with canned answers so the C entry
//! points can be driven end to end over a real TLS channel.

use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use ledger_bridge::gateway::proto::{
    ChaincodeInvocationSpec, ChaincodeProposalPayload, CommitStatusResponse, EndorseRequest,
    EndorseResponse, Envelope, EvaluateRequest, EvaluateResponse, Proposal, Response,
    SignedCommitStatusRequest, SignedProposal, SubmitRequest, SubmitResponse,
};
use prost::Message;
use tokio::sync::oneshot;
use tonic::codegen::{http, Body, BoxFuture, Context, Poll, Service, StdError};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::Status;
use tonic_prost::ProstCodec;

/// How the peer answers once a request has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Evaluate returns `echo:` followed by the call's argument; submit
    /// commits as valid in block 1.
    Echo,
    /// Accept the request and never answer.
    Silent,
}

impl Behavior {
    async fn stall(self) {
        if self == Behavior::Silent {
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Handler {
    behavior: Behavior,
}

impl UnaryService<EndorseRequest> for Handler {
    type Response = EndorseResponse;
    type Future = BoxFuture<tonic::Response<EndorseResponse>, Status>;

    fn call(&mut self, _request: tonic::Request<EndorseRequest>) -> Self::Future {
        let behavior = self.behavior;
        Box::pin(async move {
            behavior.stall().await;
            Ok(tonic::Response::new(EndorseResponse {
                prepared_transaction: Some(Envelope {
                    payload: b"prepared transaction".to_vec(),
                    signature: Vec::new(),
                }),
            }))
        })
    }
}

impl UnaryService<SubmitRequest> for Handler {
    type Response = SubmitResponse;
    type Future = BoxFuture<tonic::Response<SubmitResponse>, Status>;

    fn call(&mut self, request: tonic::Request<SubmitRequest>) -> Self::Future {
        let behavior = self.behavior;
        Box::pin(async move {
            behavior.stall().await;
            let signed = request
                .get_ref()
                .prepared_transaction
                .as_ref()
                .is_some_and(|envelope| !envelope.signature.is_empty());
            if !signed {
                return Err(Status::invalid_argument("envelope is not signed"));
            }
            Ok(tonic::Response::new(SubmitResponse {}))
        })
    }
}

impl UnaryService<SignedCommitStatusRequest> for Handler {
    type Response = CommitStatusResponse;
    type Future = BoxFuture<tonic::Response<CommitStatusResponse>, Status>;

    fn call(&mut self, _request: tonic::Request<SignedCommitStatusRequest>) -> Self::Future {
        let behavior = self.behavior;
        Box::pin(async move {
            behavior.stall().await;
            Ok(tonic::Response::new(CommitStatusResponse {
                result: 0,
                block_number: 1,
            }))
        })
    }
}

impl UnaryService<EvaluateRequest> for Handler {
    type Response = EvaluateResponse;
    type Future = BoxFuture<tonic::Response<EvaluateResponse>, Status>;

    fn call(&mut self, request: tonic::Request<EvaluateRequest>) -> Self::Future {
        let behavior = self.behavior;
        Box::pin(async move {
            behavior.stall().await;
            let argument = invocation_argument(request.get_ref().proposed_transaction.as_ref())?;
            let mut payload = b"echo:".to_vec();
            payload.extend_from_slice(&argument);
            Ok(tonic::Response::new(EvaluateResponse {
                result: Some(Response {
                    status: 200,
                    message: String::new(),
                    payload,
                }),
            }))
        })
    }
}

/// First argument after the function name in a signed proposal.
fn invocation_argument(signed: Option<&SignedProposal>) -> Result<Vec<u8>, Status> {
    let malformed = |e: prost::DecodeError| Status::invalid_argument(e.to_string());
    let signed = signed.ok_or_else(|| Status::invalid_argument("no proposal"))?;
    let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).map_err(malformed)?;
    let payload =
        ChaincodeProposalPayload::decode(proposal.payload.as_slice()).map_err(malformed)?;
    let invocation = ChaincodeInvocationSpec::decode(payload.input.as_slice()).map_err(malformed)?;
    invocation
        .chaincode_spec
        .and_then(|spec| spec.input)
        .and_then(|input| input.args.into_iter().nth(1))
        .ok_or_else(|| Status::invalid_argument("no call argument"))
}

/// Hand-written `gateway.Gateway` server, routed by request path.
#[derive(Debug, Clone)]
struct GatewayService {
    handler: Handler,
}

impl NamedService for GatewayService {
    const NAME: &'static str = "gateway.Gateway";
}

impl<B> Service<http::Request<B>> for GatewayService
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let handler = self.handler;
        match req.uri().path() {
            "/gateway.Gateway/Endorse" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<EndorseResponse, EndorseRequest>::default());
                Ok(grpc.unary(handler, req).await)
            }),
            "/gateway.Gateway/Submit" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<SubmitResponse, SubmitRequest>::default());
                Ok(grpc.unary(handler, req).await)
            }),
            "/gateway.Gateway/CommitStatus" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<
                    CommitStatusResponse,
                    SignedCommitStatusRequest,
                >::default());
                Ok(grpc.unary(handler, req).await)
            }),
            "/gateway.Gateway/Evaluate" => Box::pin(async move {
                let mut grpc =
                    Grpc::new(ProstCodec::<EvaluateResponse, EvaluateRequest>::default());
                Ok(grpc.unary(handler, req).await)
            }),
            _ => Box::pin(async move { Ok(Status::unimplemented("").into_http()) }),
        }
    }
}

/// A running TLS gateway peer. Stops when dropped.
pub struct GatewayPeer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl GatewayPeer {
    /// Serve on a free loopback port with the given certificate and key.
    pub fn start(cert_pem: &str, key_pem: &str, behavior: Behavior) -> Self {
        let addr = free_port();
        let identity = Identity::from_pem(cert_pem, key_pem);
        let (shutdown, stopped) = oneshot::channel::<()>();
        let service = GatewayService {
            handler: Handler { behavior },
        };

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                Server::builder()
                    .tls_config(ServerTlsConfig::new().identity(identity))
                    .unwrap()
                    .add_service(service)
                    .serve_with_shutdown(addr, async {
                        let _ = stopped.await;
                    })
                    .await
                    .unwrap();
            });
        });

        wait_until_listening(addr);
        Self {
            addr,
            shutdown: Some(shutdown),
        }
    }
}

impl Drop for GatewayPeer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn wait_until_listening(addr: SocketAddr) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while TcpStream::connect(addr).is_err() {
        assert!(Instant::now() < deadline, "gateway peer never started on {}", addr);
        thread::sleep(Duration::from_millis(20));
    }
}
