//! Per-method role-based access control.
//!
//! # Responsibilities
//! - Hold the method → allowed-roles table (read-only after startup)
//! - Decide, per call, whether the presented credential may invoke the method
//!
//! # Decision order
//! ```text
//! method not in table          → NotFound
//! GUEST allowed                → admit (credential optional)
//! no credential                → Unauthenticated
//! credential fails to verify   → Unauthenticated ("bad access token")
//! role not allowed             → PermissionDenied
//! otherwise                    → admit
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tonic::Status;

use crate::proto::{auth, identity, movie, testing};

use super::session::{SessionClaims, SessionManager};
use super::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("method `{method}`: {source}")]
    UnknownRole {
        method: String,
        #[source]
        source: super::role::UnknownRole,
    },
    #[error("method `{0}` lists no roles")]
    EmptyRoles(String),
}

/// Fully-qualified method name → roles allowed to call it.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    routes: HashMap<String, HashSet<Role>>,
}

impl AccessPolicy {
    /// An empty policy: every method is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `roles` on `method`, replacing any earlier entry.
    pub fn allow(mut self, method: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        self.routes.insert(method.into(), roles.into_iter().collect());
        self
    }

    /// The table covering every method this server exposes.
    pub fn builtin() -> Self {
        use Role::*;
        let members = [Normal, Subscribed, Admin];
        let editors = [Admin, Subscribed];

        Self::new()
            .allow(auth::methods::LOGIN, [Guest])
            .allow(auth::methods::LOGOUT, members)
            .allow(identity::methods::CREATE_USER, [Guest])
            .allow(identity::methods::GET_USER, members)
            .allow(identity::methods::UPDATE_USER, members)
            .allow(identity::methods::DELETE_USER, members)
            .allow(identity::methods::LIST_USERS, [Admin])
            .allow(movie::methods::LIST_MOVIES, [Guest])
            .allow(movie::methods::GET_MOVIE, [Guest])
            .allow(movie::methods::CREATE_MOVIE, editors)
            .allow(movie::methods::UPDATE_MOVIE, editors)
            .allow(movie::methods::PARTIAL_UPDATE_MOVIE, editors)
            .allow(movie::methods::DELETE_MOVIE, editors)
            .allow(testing::methods::PING, [Guest])
            .allow(testing::methods::PING_LIST, [Guest])
            .allow(testing::methods::PING_STREAM, [Guest])
    }

    /// Apply entries from configuration on top of this table.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Result<Self, PolicyError> {
        for (method, names) in overrides {
            if names.is_empty() {
                return Err(PolicyError::EmptyRoles(method.clone()));
            }
            let roles = names
                .iter()
                .map(|name| name.parse::<Role>())
                .collect::<Result<HashSet<_>, _>>()
                .map_err(|source| PolicyError::UnknownRole {
                    method: method.clone(),
                    source,
                })?;
            self.routes.insert(method.clone(), roles);
        }
        Ok(self)
    }

    pub fn allowed_roles(&self, method: &str) -> Option<&HashSet<Role>> {
        self.routes.get(method)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Identity of an admitted caller, handed to business handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Guest,
    Session(SessionClaims),
}

impl Caller {
    pub fn role(&self) -> Role {
        match self {
            Caller::Guest => Role::Guest,
            Caller::Session(claims) => claims.role,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Caller::Guest => None,
            Caller::Session(claims) => Some(&claims.sub),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

/// Applies the access policy to incoming calls.
#[derive(Debug, Clone)]
pub struct Authorizer {
    policy: Arc<AccessPolicy>,
    sessions: Arc<SessionManager>,
}

impl Authorizer {
    pub fn new(policy: AccessPolicy, sessions: Arc<SessionManager>) -> Self {
        Self {
            policy: Arc::new(policy),
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Decide whether `credential` may invoke `method`.
    ///
    /// On guest-open methods a credential is not required; when one is
    /// present and valid the caller is still identified.
    pub fn authorize(&self, method: &str, credential: Option<&str>) -> Result<Caller, Status> {
        tracing::debug!(method, "Authorizing call");

        let allowed = self
            .policy
            .allowed_roles(method)
            .ok_or_else(|| Status::not_found(format!("unknown service {method}")))?;

        if allowed.contains(&Role::Guest) {
            let caller = credential
                .and_then(|value| self.sessions.verify(value).ok())
                .map_or(Caller::Guest, Caller::Session);
            return Ok(caller);
        }

        let credential = credential
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Status::unauthenticated("authorization token is not provided"))?;

        let claims = self.sessions.verify(credential).map_err(|err| {
            tracing::debug!(method, error = %err, "Session token rejected");
            Status::unauthenticated("bad access token")
        })?;

        if !allowed.contains(&claims.role) {
            return Err(Status::permission_denied("not allowed to access this feature"));
        }

        Ok(Caller::Session(claims))
    }
}
