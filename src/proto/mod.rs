//! Wire messages and generated RPC stubs.
//!
//! # Packages
//! ```text
//! auth.AuthService          Login, Logout
//! identity.IdentityService  CreateUser, GetUser, UpdateUser, DeleteUser, ListUsers
//! movie.MovieService        ListMovies, GetMovie, CreateMovie, UpdateMovie,
//!                           PartialUpdateMovie, DeleteMovie
//! testing.TestService       Ping, PingList (server stream), PingStream (bidi)
//! ```
//!
//! # Design Decisions
//! - Messages are plain `prost` structs that also derive serde, so the JSON
//!   gateway and the binary protocol share one set of shapes
//! - Each package exposes its fully-qualified method names as constants;
//!   the access policy, observers and both transports key on these

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod identity;
pub mod movie;
pub mod testing;

/// Empty response body.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Empty {}
