//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared backend (chain, stores, services) from configuration
//! - Register the built-in observers the configuration asks for
//! - Create bootstrap accounts before any traffic is accepted
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One backend instance is shared by both transports, so the limiter
//!   and the observer registry see all traffic

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PaginationConfig, ServerConfig};
use crate::lifecycle::EndpointError;
use crate::observability::{LoggingObserver, MetricsObserver};
use crate::pagination::PageTokenCodec;
use crate::proto::identity::User;
use crate::rpc::{InterceptorChain, ObserverRegistry};
use crate::security::{AccessPolicy, Authorizer, FixedWindowLimiter, Role, SessionManager};
use crate::services::{AccountService, CatalogService, LoginService, PageLimits, PingService};
use crate::storage::{MovieStore, UserDirectory, UserStore};

/// Everything both front ends dispatch into.
pub struct Backend {
    pub chain: Arc<InterceptorChain>,
    pub sessions: Arc<SessionManager>,
    pub login: Arc<LoginService>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub ping: Arc<PingService>,
}

fn page_codec(config: &PaginationConfig) -> PageTokenCodec {
    match &config.salt {
        Some(salt) => PageTokenCodec::with_salt(salt.clone()),
        None => PageTokenCodec::new(),
    }
}

fn observers(config: &ServerConfig) -> Arc<ObserverRegistry> {
    let registry = Arc::new(ObserverRegistry::new());
    if config.observability.log_calls {
        let logger = Arc::new(LoggingObserver::new(config.observability.verbose));
        registry.register_unary_observer(logger.clone());
        registry.register_stream_request_observer(logger.clone());
        registry.register_stream_response_observer(logger);
    }
    if config.observability.metrics_enabled {
        registry.register_unary_observer(Arc::new(MetricsObserver));
        registry.register_stream_request_observer(Arc::new(MetricsObserver));
        registry.register_stream_response_observer(Arc::new(MetricsObserver));
    }
    registry
}

impl Backend {
    /// Build the backend and provision `bootstrap_users`.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, EndpointError> {
        let sessions = Arc::new(SessionManager::new(
            config.auth.signing_key.as_bytes(),
            Duration::from_secs(config.auth.token_ttl_secs),
        ));

        let policy = AccessPolicy::builtin().with_overrides(&config.access_policy)?;
        tracing::debug!(methods = policy.len(), "Access policy loaded");

        let limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_limit.quota,
            Duration::from_secs(config.rate_limit.window_secs),
        ));
        let chain = InterceptorChain::builder()
            .authorizer(Authorizer::new(policy, Arc::clone(&sessions)))
            .limiter(limiter)
            .observers(observers(config))
            .build()?;

        let limits = PageLimits {
            default_size: config.pagination.default_page_size,
            max_size: config.pagination.max_page_size,
        };
        let users = Arc::new(UserStore::new());
        let accounts = AccountService::new(
            Arc::clone(&users),
            page_codec(&config.pagination),
            limits,
            config.auth.password_cost,
        );
        let catalog = CatalogService::new(Arc::new(MovieStore::new()), page_codec(&config.pagination), limits);
        let directory: Arc<dyn UserDirectory> = users;
        let login = LoginService::new(directory, Arc::clone(&sessions), config.auth.password_cost);

        for bootstrap in &config.bootstrap_users {
            let role: Role = bootstrap.role.parse().map_err(|e| EndpointError::Bootstrap {
                username: bootstrap.username.clone(),
                reason: format!("{e}"),
            })?;
            let user = User {
                username: bootstrap.username.clone(),
                email: bootstrap.email.clone(),
                password: bootstrap.password.clone(),
                ..Default::default()
            };
            accounts
                .provision(user, role)
                .await
                .map_err(|status| EndpointError::Bootstrap {
                    username: bootstrap.username.clone(),
                    reason: status.message().to_string(),
                })?;
        }

        Ok(Self {
            chain: Arc::new(chain),
            sessions,
            login: Arc::new(login),
            accounts: Arc::new(accounts),
            catalog: Arc::new(catalog),
            ping: Arc::new(PingService),
        })
    }
}
