//! `identity` package.

use serde::{Deserialize, Serialize};

include!(concat!(env!("OUT_DIR"), "/identity.IdentityService.rs"));

pub mod methods {
    pub const CREATE_USER: &str = "/identity.IdentityService/CreateUser";
    pub const GET_USER: &str = "/identity.IdentityService/GetUser";
    pub const UPDATE_USER: &str = "/identity.IdentityService/UpdateUser";
    pub const DELETE_USER: &str = "/identity.IdentityService/DeleteUser";
    pub const LIST_USERS: &str = "/identity.IdentityService/ListUsers";
}

/// A user account as seen on the wire. `password` is input-only and is
/// always blank in responses.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[prost(enumeration = "crate::security::Role", tag = "4")]
    #[serde(with = "role_name")]
    pub role: i32,
    #[prost(string, tag = "5")]
    pub first_name: String,
    #[prost(string, tag = "6")]
    pub last_name: String,
    #[prost(bool, tag = "7")]
    pub active: bool,
    #[prost(int64, tag = "8")]
    pub create_time: i64,
    #[prost(int64, tag = "9")]
    pub update_time: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    #[prost(message, optional, tag = "1")]
    pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserRequest {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[prost(message, optional, tag = "1")]
    pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteUserRequest {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    #[prost(int32, tag = "1")]
    pub page_size: i32,
    #[prost(string, tag = "2")]
    pub page_token: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersResponse {
    #[prost(message, repeated, tag = "1")]
    pub users: Vec<User>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

/// JSON form of the `role` field: the role name rather than its number.
mod role_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::security::Role;

    pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        let role = Role::try_from(*value).unwrap_or_default();
        serializer.serialize_str(role.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Role>()
            .map(i32::from)
            .map_err(serde::de::Error::custom)
    }
}
