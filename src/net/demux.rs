//! Connection demultiplexer: one listening socket, two protocol servers.
//!
//! # Data Flow
//! ```text
//! Listener::accept (permit held)
//!     → optional TLS handshake
//!     → sniff leading bytes (bounded by classify_timeout)
//!         HTTP/2 connection preface  → RPC incoming stream (tonic)
//!         HTTP/1 method token + ' '  → HTTP incoming listener (axum)
//!         anything else              → RPC if fallback_to_rpc, else dropped
//!     → MuxedConn replays the sniffed bytes to the chosen server
//! ```
//!
//! # Design Decisions
//! - Classification happens on a per-connection task so a slow client
//!   never stalls the accept loop
//! - The RPC rule only needs the preface, which is also what an h2 stream
//!   looks like after local TLS termination; opaque streams forwarded by an
//!   external terminator need the fallback rule
//! - Shutdown takes the routes out from under a lock; calling it twice is a no-op

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use axum_server::accept::Accept;
use axum_server::tls_rustls::RustlsAcceptor;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::DemuxConfig;
use crate::lifecycle::Shutdown;
use crate::net::connection::{ConnectionTracker, Io, MuxConnectInfo, MuxedConn};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::observability::metrics;

/// First bytes of every HTTP/2 connection (RFC 9113 §3.4).
pub const HTTP2_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const HTTP1_METHODS: [&[u8]; 9] = [
    b"GET ",
    b"POST ",
    b"PUT ",
    b"DELETE ",
    b"PATCH ",
    b"HEAD ",
    b"OPTIONS ",
    b"CONNECT ",
    b"TRACE ",
];

const ROUTE_BUFFER: usize = 128;
const SNIFF_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Rpc,
    Http,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Rpc => "rpc",
            Protocol::Http => "http",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Matched(Protocol),
    NeedMore,
    Unmatched,
}

/// Classify a connection from the bytes read so far.
pub fn classify(prefix: &[u8]) -> Classification {
    if prefix.starts_with(HTTP2_PREFACE) {
        return Classification::Matched(Protocol::Rpc);
    }
    let mut partial = HTTP2_PREFACE.starts_with(prefix);
    for method in HTTP1_METHODS {
        if prefix.starts_with(method) {
            return Classification::Matched(Protocol::Http);
        }
        partial |= method.starts_with(prefix);
    }
    if partial {
        Classification::NeedMore
    } else {
        Classification::Unmatched
    }
}

#[derive(Debug, Error)]
pub enum DemuxError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Incoming connection stream for `tonic`'s `serve_with_incoming_shutdown`.
pub type RpcIncoming = ReceiverStream<io::Result<MuxedConn>>;

/// Derived listener for `axum::serve`.
pub struct HttpIncoming {
    rx: mpsc::Receiver<MuxedConn>,
    local_addr: SocketAddr,
}

impl axum::serve::Listener for HttpIncoming {
    type Io = MuxedConn;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.rx.recv().await {
            Some(conn) => {
                let peer = conn.peer_addr();
                (conn, peer)
            }
            // demux shut down: axum's graceful shutdown ends the serve loop
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

impl Connected<IncomingStream<'_, HttpIncoming>> for MuxConnectInfo {
    fn connect_info(stream: IncomingStream<'_, HttpIncoming>) -> Self {
        stream.io().info()
    }
}

struct Routes {
    rpc: mpsc::Sender<io::Result<MuxedConn>>,
    http: mpsc::Sender<MuxedConn>,
}

pub struct Demux {
    listener: Listener,
    tls: Option<RustlsAcceptor>,
    classify_timeout: Duration,
    fallback_to_rpc: bool,
    tracker: ConnectionTracker,
    routes: Mutex<Option<Routes>>,
}

impl Demux {
    /// Wrap `listener`, returning the demux and its two derived listeners.
    pub fn new(
        listener: Listener,
        tls: Option<RustlsAcceptor>,
        config: &DemuxConfig,
    ) -> io::Result<(Arc<Self>, RpcIncoming, HttpIncoming)> {
        let local_addr = listener.local_addr()?;
        let (rpc_tx, rpc_rx) = mpsc::channel(ROUTE_BUFFER);
        let (http_tx, http_rx) = mpsc::channel(ROUTE_BUFFER);

        let demux = Arc::new(Self {
            listener,
            tls,
            classify_timeout: config.classify_timeout(),
            fallback_to_rpc: config.fallback_to_rpc,
            tracker: ConnectionTracker::new(),
            routes: Mutex::new(Some(Routes {
                rpc: rpc_tx,
                http: http_tx,
            })),
        });
        let http = HttpIncoming {
            rx: http_rx,
            local_addr,
        };
        Ok((demux, ReceiverStream::new(rpc_rx), http))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept and route connections until `shutdown` fires.
    pub async fn serve(self: Arc<Self>, shutdown: Shutdown) -> Result<(), DemuxError> {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.wait() => break,
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer, permit)) => {
                    let demux = Arc::clone(&self);
                    tokio::spawn(async move { demux.route(stream, peer, permit).await });
                }
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Accept failed");
                }
                Err(e) => {
                    self.shutdown();
                    return Err(e.into());
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Stop handing connections to the protocol servers. Idempotent.
    pub fn shutdown(&self) {
        let routes = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if routes.is_some() {
            tracing::info!("Demultiplexer closed");
        }
    }

    fn routes(&self) -> Option<(mpsc::Sender<io::Result<MuxedConn>>, mpsc::Sender<MuxedConn>)> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|routes| (routes.rpc.clone(), routes.http.clone()))
    }

    async fn route(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let _ = stream.set_nodelay(true);

        let sniffed = tokio::time::timeout(self.classify_timeout, async {
            let mut io: Box<dyn Io> = match &self.tls {
                Some(acceptor) => {
                    let (tls, ()) = acceptor.accept(stream, ()).await?;
                    Box::new(tls)
                }
                None => Box::new(stream),
            };
            let (protocol, prefix) = sniff(&mut io, self.fallback_to_rpc).await?;
            Ok::<_, io::Error>((io, protocol, prefix))
        })
        .await;

        let (io, protocol, prefix) = match sniffed {
            Ok(Ok((io, Some(protocol), prefix))) => (io, protocol, prefix),
            Ok(Ok((_, None, prefix))) => {
                tracing::debug!(%peer, connection_id = %guard.id(), leading = ?String::from_utf8_lossy(&prefix), "Unrecognized protocol");
                metrics::record_dropped_connection("unmatched");
                return;
            }
            Ok(Err(e)) => {
                tracing::debug!(%peer, connection_id = %guard.id(), error = %e, "Connection failed before classification");
                metrics::record_dropped_connection("io");
                return;
            }
            Err(_) => {
                tracing::debug!(%peer, connection_id = %guard.id(), "Classification timed out");
                metrics::record_dropped_connection("timeout");
                return;
            }
        };

        let Some((rpc, http)) = self.routes() else {
            metrics::record_dropped_connection("shutdown");
            return;
        };

        tracing::debug!(%peer, connection_id = %guard.id(), protocol = protocol.as_str(), "Connection classified");
        metrics::record_connection(protocol.as_str());

        let conn = MuxedConn::new(io, prefix, peer, guard, Some(permit));
        let forwarded = match protocol {
            Protocol::Rpc => rpc.send(Ok(conn)).await.is_ok(),
            Protocol::Http => http.send(conn).await.is_ok(),
        };
        if !forwarded {
            metrics::record_dropped_connection("shutdown");
        }
    }
}

/// Read until the leading bytes classify. `None` means unmatched with no fallback.
async fn sniff(io: &mut Box<dyn Io>, fallback_to_rpc: bool) -> io::Result<(Option<Protocol>, Vec<u8>)> {
    let mut prefix = Vec::with_capacity(HTTP2_PREFACE.len());
    let mut chunk = [0u8; SNIFF_CHUNK];
    loop {
        match classify(&prefix) {
            Classification::Matched(protocol) => return Ok((Some(protocol), prefix)),
            Classification::Unmatched => {
                return Ok((fallback_to_rpc.then_some(Protocol::Rpc), prefix));
            }
            Classification::NeedMore => {
                let n = io.read(&mut chunk).await?;
                if n == 0 {
                    return Err(io::ErrorKind::UnexpectedEof.into());
                }
                prefix.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn classifies_complete_prefixes() {
        assert_eq!(classify(HTTP2_PREFACE), Classification::Matched(Protocol::Rpc));
        assert_eq!(
            classify(b"GET /v1/movies HTTP/1.1\r\n"),
            Classification::Matched(Protocol::Http)
        );
        assert_eq!(classify(b"DELETE /v1/users/x"), Classification::Matched(Protocol::Http));
        assert_eq!(classify(b"\x16\x03\x01\x02\x00"), Classification::Unmatched);
        assert_eq!(classify(b"GETX"), Classification::Unmatched);
    }

    #[test]
    fn ambiguous_prefixes_need_more() {
        assert_eq!(classify(b""), Classification::NeedMore);
        assert_eq!(classify(b"P"), Classification::NeedMore);
        assert_eq!(classify(b"PRI * HTTP/2.0"), Classification::NeedMore);
        assert_eq!(classify(b"PO"), Classification::NeedMore);
        assert_eq!(classify(b"OPTIONS"), Classification::NeedMore);
    }

    #[tokio::test]
    async fn sniff_reads_across_small_writes() {
        let (mut client, server) = tokio::io::duplex(256);
        let mut io: Box<dyn Io> = Box::new(server);

        let writer = tokio::spawn(async move {
            for part in HTTP2_PREFACE.chunks(5) {
                client.write_all(part).await.unwrap();
                tokio::task::yield_now().await;
            }
            client
        });

        let (protocol, prefix) = sniff(&mut io, false).await.unwrap();
        assert_eq!(protocol, Some(Protocol::Rpc));
        assert_eq!(prefix, HTTP2_PREFACE);
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn unmatched_bytes_use_fallback_setting() {
        for (fallback, expected) in [(false, None), (true, Some(Protocol::Rpc))] {
            let (mut client, server) = tokio::io::duplex(64);
            let mut io: Box<dyn Io> = Box::new(server);
            client.write_all(b"\x16\x03\x01").await.unwrap();

            let (protocol, prefix) = sniff(&mut io, fallback).await.unwrap();
            assert_eq!(protocol, expected);
            assert_eq!(prefix, b"\x16\x03\x01");
        }
    }

    #[tokio::test]
    async fn early_eof_is_an_error() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let mut io: Box<dyn Io> = Box::new(server);
        let err = sniff(&mut io, true).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
