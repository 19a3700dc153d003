//! Interceptor chain: authorization → rate limit → observation → handler.
//!
//! # Responsibilities
//! - Run every call through the same fixed order of checks
//! - Short-circuit on the first rejection; the handler never runs
//! - Report handler outcomes (success or error) to observers unchanged
//!
//! # Design Decisions
//! - Authorization runs before the limiter, so a call rejected as
//!   unauthenticated or forbidden does not consume quota
//! - A chain cannot be built without a limiter
//! - Streaming calls are admitted once, at establishment

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tonic::Status;

use crate::observability::metrics;
use crate::security::{Authorizer, Caller, Limiter};

use super::context::CallContext;
use super::observer::{ObservedStream, ObserverRegistry};
use super::stream::ServerStream;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("interceptor chain requires an authorizer")]
    MissingAuthorizer,
    #[error("interceptor chain requires a rate limiter")]
    MissingLimiter,
}

/// Builder for [`InterceptorChain`].
#[derive(Default)]
pub struct ChainBuilder {
    authorizer: Option<Authorizer>,
    limiter: Option<Arc<dyn Limiter>>,
    observers: Option<Arc<ObserverRegistry>>,
}

impl ChainBuilder {
    pub fn authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn limiter(mut self, limiter: Arc<dyn Limiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Share an existing registry; a fresh one is created otherwise.
    pub fn observers(mut self, observers: Arc<ObserverRegistry>) -> Self {
        self.observers = Some(observers);
        self
    }

    pub fn build(self) -> Result<InterceptorChain, ChainError> {
        Ok(InterceptorChain {
            authorizer: self.authorizer.ok_or(ChainError::MissingAuthorizer)?,
            limiter: self.limiter.ok_or(ChainError::MissingLimiter)?,
            observers: self.observers.unwrap_or_default(),
        })
    }
}

/// The ordered set of interceptors wrapped around every service method.
pub struct InterceptorChain {
    authorizer: Authorizer,
    limiter: Arc<dyn Limiter>,
    observers: Arc<ObserverRegistry>,
}

impl InterceptorChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    fn admit(&self, ctx: &CallContext) -> Result<Caller, Status> {
        let method = ctx.method();

        let caller = self
            .authorizer
            .authorize(method, ctx.authorization.as_deref())
            .inspect_err(|status| {
                tracing::info!(
                    method,
                    transport = %ctx.info.transport,
                    code = ?status.code(),
                    "Call rejected by authorization"
                );
                metrics::record_rejection(method, status.code());
            })?;

        if self.limiter.did_limit_exceed() {
            tracing::warn!(method, transport = %ctx.info.transport, "Rate limit exceeded");
            let status = Status::resource_exhausted(format!(
                "{method} is rejected by the API. Please retry after a while."
            ));
            metrics::record_rejection(method, status.code());
            return Err(status);
        }

        Ok(caller)
    }

    /// Run a unary call through the chain.
    pub async fn unary<Req, Resp, F, Fut>(&self, ctx: CallContext, request: Req, handler: F) -> Result<Resp, Status>
    where
        Req: prost::Message + Clone + 'static,
        Resp: prost::Message + 'static,
        F: FnOnce(Caller, Req) -> Fut,
        Fut: Future<Output = Result<Resp, Status>>,
    {
        let caller = self.admit(&ctx)?;

        let observed = request.clone();
        let result = handler(caller, request).await;

        match &result {
            Ok(response) => self.observers.notify_unary(&ctx.info, &observed, Ok(response)),
            Err(status) => self.observers.notify_unary(&ctx.info, &observed, Err(status)),
        }
        result
    }

    /// Admit a streaming call and wrap its stream for observation.
    pub fn stream<S: ServerStream>(&self, ctx: &CallContext, stream: S) -> Result<(Caller, ObservedStream<S>), Status> {
        let caller = self.admit(ctx)?;
        let observed = ObservedStream::new(stream, ctx.info.clone(), Arc::clone(&self.observers));
        Ok((caller, observed))
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("authorizer", &self.authorizer)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
