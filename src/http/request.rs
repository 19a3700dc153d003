//! Call metadata extracted from gateway requests.
//!
//! # Responsibilities
//! - Read the `authorization` header the same way RPC metadata is read
//! - Recover the peer address recorded by the demux listener
//!   (`ConnectInfo<MuxConnectInfo>`)

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::net::MuxConnectInfo;
use crate::rpc::{collect_headers, CallContext, Transport};

/// Credential and peer for a gateway request. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct CallMeta {
    pub authorization: Option<String>,
    pub peer: Option<SocketAddr>,
    pub headers: Vec<(String, String)>,
}

impl CallMeta {
    /// Unary chain context for `method` on the HTTP transport.
    pub fn context(&self, method: &'static str) -> CallContext {
        CallContext::unary(method, Transport::Http)
            .with_authorization(self.authorization.clone())
            .with_peer(self.peer)
            .with_headers(self.headers.clone())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let peer = parts
            .extensions
            .get::<ConnectInfo<MuxConnectInfo>>()
            .map(|ConnectInfo(info)| info.peer);
        let headers = collect_headers(
            parts
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.to_str().ok())),
        );
        Ok(Self {
            authorization,
            peer,
            headers,
        })
    }
}
