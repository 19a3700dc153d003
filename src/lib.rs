//! Dual-protocol API server: one port, a binary RPC server and a JSON
//! gateway, with every call passing through the same authorization,
//! rate-limit and observation chain.

pub mod config;
pub mod error;
pub mod grpc;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pagination;
pub mod proto;
pub mod rpc;
pub mod security;
pub mod services;
pub mod storage;

pub use config::schema::ServerConfig;
pub use error::{Error, Result};
pub use lifecycle::{Endpoint, EndpointHandle, Shutdown};
