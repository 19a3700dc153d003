//! Per-call metadata seen by interceptors and observers.

use std::fmt;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    BidiStreaming,
}

/// Which front-end carried the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Rpc,
    Http,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Rpc => "rpc",
            Transport::Http => "http",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a call, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    /// Fully-qualified method, e.g. `/movie.MovieService/GetMovie`.
    pub method: &'static str,
    pub kind: CallKind,
    pub transport: Transport,
    /// Request metadata as `(name, value)` pairs, credentials redacted.
    pub headers: Vec<(String, String)>,
}

/// Placeholder logged in place of credential values.
pub const REDACTED: &str = "<redacted>";

/// Collect printable header pairs, hiding the `authorization` value.
pub fn collect_headers<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .filter_map(|(name, value)| {
            let value = if name.eq_ignore_ascii_case("authorization") {
                REDACTED
            } else {
                value?
            };
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Everything the chain needs to admit a call.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub info: CallInfo,
    /// Raw `authorization` metadata value, if presented.
    pub authorization: Option<String>,
    pub peer: Option<SocketAddr>,
}

impl CallContext {
    pub fn new(method: &'static str, kind: CallKind, transport: Transport) -> Self {
        Self {
            info: CallInfo {
                method,
                kind,
                transport,
                headers: Vec::new(),
            },
            authorization: None,
            peer: None,
        }
    }

    pub fn unary(method: &'static str, transport: Transport) -> Self {
        Self::new(method, CallKind::Unary, transport)
    }

    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn with_peer(mut self, peer: Option<SocketAddr>) -> Self {
        self.peer = peer;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.info.headers = headers;
        self
    }

    pub fn method(&self) -> &'static str {
        self.info.method
    }
}
