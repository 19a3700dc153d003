//! Binary-RPC front end.
//!
//! # Responsibilities
//! - Implement the generated tonic service traits on [`RpcAdapter`]
//! - Lift `authorization` metadata and the demux peer into a [`CallContext`]
//! - Serve all four services on the demultiplexer's RPC stream with
//!   graceful drain
//!
//! # Design Decisions
//! - Method names come from `proto::*::methods`, never from the HTTP path,
//!   so both transports share one access-policy table
//! - Streaming handlers run on their own task; the response body is the
//!   receiving half of a channel and ends when the handler returns

mod services;

use std::sync::Arc;
use std::time::Duration;

use tonic::transport::Server;
use tonic::Request;

use crate::config::RpcConfig;
use crate::lifecycle::{Backend, Shutdown};
use crate::net::{MuxConnectInfo, RpcIncoming};
use crate::proto::auth::auth_service_server::AuthServiceServer;
use crate::proto::identity::identity_service_server::IdentityServiceServer;
use crate::proto::movie::movie_service_server::MovieServiceServer;
use crate::proto::testing::test_service_server::TestServiceServer;
use crate::rpc::{collect_headers, CallContext, CallKind, InterceptorChain, Transport};

/// Messages buffered between a streaming handler and the response body.
pub const STREAM_BUFFER: usize = 16;

/// A business service bound to the interceptor chain.
pub struct RpcAdapter<S> {
    chain: Arc<InterceptorChain>,
    service: Arc<S>,
}

impl<S> RpcAdapter<S> {
    pub fn new(chain: Arc<InterceptorChain>, service: Arc<S>) -> Self {
        Self { chain, service }
    }
}

/// Build the chain context for an incoming tonic request.
pub fn call_context<T>(request: &Request<T>, method: &'static str, kind: CallKind) -> CallContext {
    let authorization = request
        .metadata()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let peer = request
        .extensions()
        .get::<MuxConnectInfo>()
        .map(|info| info.peer)
        .or_else(|| request.remote_addr());
    let metadata = request.metadata().clone().into_headers();
    let headers = collect_headers(metadata.iter().map(|(name, value)| (name.as_str(), value.to_str().ok())));

    CallContext::new(method, kind, Transport::Rpc)
        .with_authorization(authorization)
        .with_peer(peer)
        .with_headers(headers)
}

/// Serve every RPC service on `incoming` until `shutdown` fires, then
/// drain in-flight calls.
pub async fn serve(
    backend: &Backend,
    config: &RpcConfig,
    incoming: RpcIncoming,
    shutdown: Shutdown,
) -> Result<(), tonic::transport::Error> {
    let chain = &backend.chain;

    tracing::info!(
        max_connection_age_secs = config.max_connection_age_secs,
        "RPC server starting"
    );

    Server::builder()
        .max_connection_age(Duration::from_secs(config.max_connection_age_secs))
        .add_service(AuthServiceServer::new(RpcAdapter::new(
            Arc::clone(chain),
            Arc::clone(&backend.login),
        )))
        .add_service(IdentityServiceServer::new(RpcAdapter::new(
            Arc::clone(chain),
            Arc::clone(&backend.accounts),
        )))
        .add_service(MovieServiceServer::new(RpcAdapter::new(
            Arc::clone(chain),
            Arc::clone(&backend.catalog),
        )))
        .add_service(TestServiceServer::new(RpcAdapter::new(
            Arc::clone(chain),
            Arc::clone(&backend.ping),
        )))
        .serve_with_incoming_shutdown(incoming, shutdown.signalled())
        .await?;

    tracing::info!("RPC server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ConnectionId;

    #[test]
    fn context_reads_metadata_and_peer() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert("authorization", "Basic abc".parse().unwrap());
        let peer = "10.0.0.7:4100".parse().unwrap();
        request.extensions_mut().insert(MuxConnectInfo {
            peer,
            id: ConnectionId::new(),
        });

        let ctx = call_context(&request, "/movie.MovieService/GetMovie", CallKind::Unary);
        assert_eq!(ctx.authorization.as_deref(), Some("Basic abc"));
        assert_eq!(ctx.peer, Some(peer));
        assert_eq!(ctx.info.transport, Transport::Rpc);
        assert!(ctx
            .info
            .headers
            .contains(&("authorization".to_string(), "<redacted>".to_string())));
    }

    #[test]
    fn context_without_metadata_is_anonymous() {
        let ctx = call_context(&Request::new(()), "/testing.TestService/Ping", CallKind::Unary);
        assert!(ctx.authorization.is_none());
        assert!(ctx.peer.is_none());
    }
}
