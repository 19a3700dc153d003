//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use ms_project::config::{BootstrapUser, ServerConfig};
use ms_project::lifecycle::{Backend, EndpointError, EndpointHandle};
use ms_project::security::Role;
use ms_project::Endpoint;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Small, fast config on an ephemeral loopback port.
pub fn config(quota: u32) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.signing_key = "integration-test-key".into();
    config.auth.password_cost = 4;
    config.rate_limit.quota = quota;
    config.rate_limit.window_secs = 60;
    config.shutdown.grace_period_secs = 5;
    config.observability.log_calls = false;
    config.bootstrap_users.push(BootstrapUser {
        username: ADMIN.into(),
        email: "admin@example.com".into(),
        password: ADMIN_PASSWORD.into(),
        role: "ADMIN".into(),
    });
    config
}

pub struct TestEndpoint {
    pub addr: SocketAddr,
    pub handle: EndpointHandle,
    pub backend: Arc<Backend>,
    pub task: JoinHandle<Result<(), EndpointError>>,
}

impl TestEndpoint {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Mint a credential without going through `Login`, so no quota is spent.
    pub fn credential(&self, subject: &str, role: Role) -> String {
        format!("Basic {}", self.backend.sessions.issue(subject, role).unwrap())
    }

    pub async fn stop(self) {
        self.handle.shutdown().await;
        self.task.await.unwrap().unwrap();
    }
}

pub async fn start(config: ServerConfig) -> TestEndpoint {
    let bound = Endpoint::new(config).await.unwrap().bind().await.unwrap();
    let addr = bound.local_addr();
    let handle = bound.handle();
    let backend = Arc::clone(bound.backend());
    let task = tokio::spawn(bound.run());

    TestEndpoint {
        addr,
        handle,
        backend,
        task,
    }
}

/// Attach an `authorization` header to an outgoing RPC request.
pub fn authorized<T>(message: T, credential: &str) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request
        .metadata_mut()
        .insert("authorization", credential.parse().unwrap());
    request
}
