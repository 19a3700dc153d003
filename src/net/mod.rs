//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → tls.rs (optional TLS handshake)
//!     → demux.rs (classify by leading bytes)
//!     → connection.rs (tracked, prefix-replaying MuxedConn)
//!     → tonic server | axum gateway
//!
//! Connection States:
//!     Accepted → Classified(rpc | http) → Forwarded
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - A pending connection lives only until it is forwarded or dropped
//! - TLS is optional and handled transparently

pub mod connection;
pub mod demux;
pub mod listener;
pub mod tls;

pub use connection::{ConnectionId, ConnectionTracker, MuxConnectInfo, MuxedConn};
pub use demux::{classify, Classification, Demux, DemuxError, HttpIncoming, Protocol, RpcIncoming};
pub use listener::{Listener, ListenerError};
