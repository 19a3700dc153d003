//! JSON/HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! HttpIncoming (classified HTTP/1 connection)
//!     → server.rs (Axum router, tower-http layers)
//!     → request.rs (authorization header, peer → CallContext)
//!     → handlers.rs (same chain and method names as the RPC side)
//!     → response.rs (Status → HTTP status + JSON error body)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::CallMeta;
pub use response::ApiError;
pub use server::{router, serve};
