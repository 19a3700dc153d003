//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming call (method, authorization metadata):
//!     → access_control.rs (policy lookup, credential check via session.rs)
//!     → rate_limit.rs (fixed-window quota)
//!     → Pass to observation + handler
//!
//! Login:
//!     → session.rs issues a signed token carrying the caller's role
//! ```
//!
//! # Design Decisions
//! - Fail closed: a method missing from the policy is unreachable
//! - Roles come only from verified tokens, never from request fields
//! - Authentication errors stay generic

pub mod access_control;
pub mod rate_limit;
pub mod role;
pub mod session;

pub use access_control::{AccessPolicy, Authorizer, Caller, PolicyError};
pub use rate_limit::{FixedWindowLimiter, Limiter};
pub use role::Role;
pub use session::{SessionClaims, SessionError, SessionManager};
