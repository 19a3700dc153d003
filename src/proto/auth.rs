//! `auth` package.

use serde::{Deserialize, Serialize};

include!(concat!(env!("OUT_DIR"), "/auth.AuthService.rs"));

pub mod methods {
    pub const LOGIN: &str = "/auth.AuthService/Login";
    pub const LOGOUT: &str = "/auth.AuthService/Logout";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    /// Signed session token; present it as `authorization: Basic <access_token>`.
    #[prost(string, tag = "1")]
    pub access_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct LogoutRequest {}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutResponse {
    #[prost(string, tag = "1")]
    pub username: String,
}
