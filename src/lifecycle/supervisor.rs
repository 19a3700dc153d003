//! Dual-protocol endpoint supervisor.
//!
//! # Lifecycle
//! ```text
//! Init          Endpoint::new: backend built, bootstrap users created
//! Listening     Endpoint::bind: shared socket bound, demux + derived listeners
//! Running       BoundEndpoint::run: demux, RPC and HTTP tasks in one JoinSet
//! ShuttingDown  signal, handle, or first task exit: stop accepting, drain
//! Stopped       all tasks joined (or aborted after the grace period)
//! ```
//!
//! # Design Decisions
//! - Fail fast: the first task to exit, for any reason, stops the others
//! - Drain is bounded by `shutdown.grace_period_secs`; stragglers are aborted
//! - Shutdown is idempotent; a second request returns once Stopped is reached

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

use crate::config::ServerConfig;
use crate::lifecycle::{Backend, Shutdown};
use crate::net::{tls, Demux, DemuxError, HttpIncoming, Listener, ListenerError, RpcIncoming};
use crate::rpc::ChainError;
use crate::security::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EndpointState {
    Init,
    Listening,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("failed to load TLS credentials: {0}")]
    Tls(#[source] std::io::Error),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("failed to create bootstrap user `{username}`: {reason}")]
    Bootstrap { username: String, reason: String },
    #[error(transparent)]
    Demux(#[from] DemuxError),
    #[error("RPC server failed: {0}")]
    Rpc(#[from] tonic::transport::Error),
    #[error("HTTP gateway failed: {0}")]
    Http(#[source] std::io::Error),
    #[error("endpoint task panicked: {0}")]
    Panicked(String),
}

type TaskResult = (&'static str, Result<(), EndpointError>);

/// An endpoint in the `Init` state.
pub struct Endpoint {
    config: ServerConfig,
    backend: Arc<Backend>,
}

impl Endpoint {
    pub async fn new(config: ServerConfig) -> Result<Self, EndpointError> {
        let backend = Backend::from_config(&config).await?;
        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Bind the shared socket. A bind failure aborts startup.
    pub async fn bind(self) -> Result<BoundEndpoint, EndpointError> {
        let listener = Listener::bind(&self.config.listener).await?;
        let tls = match &self.config.listener.tls {
            Some(tls_config) => Some(tls::acceptor(tls_config).await.map_err(EndpointError::Tls)?),
            None => None,
        };

        let (demux, rpc, http) =
            Demux::new(listener, tls, &self.config.demux).map_err(ListenerError::Bind)?;
        let local_addr = demux.local_addr().map_err(ListenerError::Bind)?;
        let (state, _) = watch::channel(EndpointState::Listening);

        Ok(BoundEndpoint {
            config: self.config,
            backend: self.backend,
            demux,
            rpc,
            http,
            local_addr,
            shutdown: Shutdown::new(),
            state,
        })
    }
}

/// An endpoint in the `Listening` state.
pub struct BoundEndpoint {
    config: ServerConfig,
    backend: Arc<Backend>,
    demux: Arc<Demux>,
    rpc: RpcIncoming,
    http: HttpIncoming,
    local_addr: SocketAddr,
    shutdown: Shutdown,
    state: watch::Sender<EndpointState>,
}

/// Cloneable control handle for a running endpoint.
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    shutdown: Shutdown,
    state: watch::Receiver<EndpointState>,
}

impl EndpointHandle {
    pub fn state(&self) -> EndpointState {
        *self.state.borrow()
    }

    /// Request shutdown without waiting.
    pub fn trigger(&self) {
        if self.shutdown.trigger() {
            tracing::info!("Shutdown requested");
        }
    }

    /// Request shutdown and wait until the endpoint has stopped.
    pub async fn shutdown(&self) {
        self.trigger();
        self.stopped().await;
    }

    /// Resolve once the endpoint reaches `Stopped` (or is gone).
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == EndpointState::Stopped).await;
    }
}

impl BoundEndpoint {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    pub fn handle(&self) -> EndpointHandle {
        EndpointHandle {
            shutdown: self.shutdown.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Serve both protocols until shutdown, then drain.
    ///
    /// Returns the first task failure, if any.
    pub async fn run(self) -> Result<(), EndpointError> {
        let BoundEndpoint {
            config,
            backend,
            demux,
            rpc,
            http,
            local_addr,
            shutdown,
            state,
        } = self;
        let grace = Duration::from_secs(config.shutdown.grace_period_secs);

        let demux_task: EndpointTask = Box::pin({
            let demux = Arc::clone(&demux);
            let shutdown = shutdown.clone();
            async move { demux.serve(shutdown).await.map_err(EndpointError::from) }
        });
        let rpc_task: EndpointTask = Box::pin({
            let backend = Arc::clone(&backend);
            let rpc_config = config.rpc.clone();
            let shutdown = shutdown.clone();
            async move {
                crate::grpc::serve(&backend, &rpc_config, rpc, shutdown)
                    .await
                    .map_err(EndpointError::from)
            }
        });
        let http_task: EndpointTask = Box::pin({
            let router = crate::http::router(Arc::clone(&backend), &config.http);
            let shutdown = shutdown.clone();
            async move {
                crate::http::serve(router, http, shutdown)
                    .await
                    .map_err(EndpointError::Http)
            }
        });

        tracing::info!(address = %local_addr, "Endpoint running");
        let result = supervise(
            vec![("demux", demux_task), ("rpc", rpc_task), ("http", http_task)],
            &shutdown,
            &state,
            grace,
            || demux.shutdown(),
        )
        .await;
        tracing::info!(open_connections = demux.tracker().active_count(), "Endpoint stopped");
        result
    }
}

type EndpointTask = Pin<Box<dyn Future<Output = Result<(), EndpointError>> + Send>>;

/// Run `tasks` as one fail-fast group.
///
/// The group moves to `Running`, then waits for `shutdown` or the first task
/// to exit. Either way it triggers `shutdown`, calls `stop_accepting`, and
/// drains the rest for at most `grace` before aborting them.
async fn supervise(
    tasks: Vec<(&'static str, EndpointTask)>,
    shutdown: &Shutdown,
    state: &watch::Sender<EndpointState>,
    grace: Duration,
    stop_accepting: impl FnOnce(),
) -> Result<(), EndpointError> {
    let mut set: JoinSet<TaskResult> = JoinSet::new();
    for (name, task) in tasks {
        set.spawn(async move { (name, task.await) });
    }
    state.send_replace(EndpointState::Running);

    let mut failure = None;
    tokio::select! {
        _ = shutdown.wait() => {}
        Some(joined) = set.join_next() => settle(joined, &mut failure),
    }

    shutdown.trigger();
    state.send_replace(EndpointState::ShuttingDown);
    stop_accepting();
    tracing::info!(grace_period_secs = grace.as_secs(), "Draining in-flight calls");

    let drained = tokio::time::timeout(grace, async {
        while let Some(joined) = set.join_next().await {
            settle(joined, &mut failure);
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(remaining = set.len(), "Grace period elapsed, aborting remaining tasks");
        set.abort_all();
        while set.join_next().await.is_some() {}
    }

    state.send_replace(EndpointState::Stopped);
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn settle(joined: Result<TaskResult, JoinError>, failure: &mut Option<EndpointError>) {
    let error = match joined {
        Ok((task, Ok(()))) => {
            tracing::info!(task, "Endpoint task finished");
            return;
        }
        Ok((task, Err(error))) => {
            tracing::error!(task, error = %error, "Endpoint task failed");
            error
        }
        Err(e) if e.is_cancelled() => return,
        Err(e) => {
            tracing::error!(error = %e, "Endpoint task panicked");
            EndpointError::Panicked(e.to_string())
        }
    };
    failure.get_or_insert(error);
}
