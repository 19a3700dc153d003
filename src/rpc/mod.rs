//! Call interception core shared by both transports.
//!
//! # Data Flow
//! ```text
//! grpc adapter / http handler
//!     → context.rs (method, kind, credential, peer)
//!     → chain.rs: authorize → rate limit → handler
//!     → observer.rs: fan out outcome to registered observers
//!
//! Streaming calls:
//!     → chain.rs: authorize → rate limit (once, at establishment)
//!     → observer.rs: ObservedStream wraps stream.rs's ServerStream
//! ```
//!
//! # Design Decisions
//! - Transport-neutral: the chain never touches tonic or axum types
//!   beyond `tonic::Status`, so the JSON gateway gets identical semantics
//! - Rejected calls never reach the limiter or the observers

pub mod chain;
pub mod context;
pub mod observer;
pub mod stream;

pub use chain::{ChainBuilder, ChainError, InterceptorChain};
pub use context::{collect_headers, CallContext, CallInfo, CallKind, Transport};
pub use observer::{
    ObservedStream, ObserverRegistry, Payload, StreamRequestObserver, StreamResponseObserver, UnaryObserver,
};
pub use stream::{ChannelStream, ServerStream};
