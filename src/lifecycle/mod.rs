//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Backend (policy, limiter, observers, services)
//!
//! Supervisor (supervisor.rs):
//!     Init → Listening → Running → ShuttingDown → Stopped
//!
//! Shutdown (shutdown.rs):
//!     Trigger → every task's signal future resolves → drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then backend, then listeners
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: remaining tasks are aborted after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::Backend;
pub use supervisor::{BoundEndpoint, Endpoint, EndpointError, EndpointHandle, EndpointState};
