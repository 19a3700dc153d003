//! `testing` package: a diagnostic service used to exercise unary, server
//! streaming and bidirectional calls through the interceptor chain.

use serde::{Deserialize, Serialize};

include!(concat!(env!("OUT_DIR"), "/testing.TestService.rs"));

pub mod methods {
    pub const PING: &str = "/testing.TestService/Ping";
    pub const PING_LIST: &str = "/testing.TestService/PingList";
    pub const PING_STREAM: &str = "/testing.TestService/PingStream";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PingRequest {
    #[prost(string, tag = "1")]
    pub value: String,
    /// When non-zero, `Ping` fails with this status code instead of echoing.
    #[prost(int32, tag = "2")]
    pub error_code_returned: i32,
    /// Number of responses `PingList` produces (0 means the default).
    #[prost(uint32, tag = "3")]
    pub count: u32,
    /// Pause between `PingList` responses.
    #[prost(uint32, tag = "4")]
    pub delay_ms: u32,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PingResponse {
    #[prost(string, tag = "1")]
    pub value: String,
    #[prost(int32, tag = "2")]
    pub counter: i32,
}
