//! Session tokens: issuing at login, verifying on every guarded call.
//!
//! # Responsibilities
//! - Sign `{subject, role, expiry}` claims with the server's HS256 key
//! - Verify signature, algorithm and expiry of presented credentials
//!
//! # Design Decisions
//! - Verification is self-contained; no lookup against the user store
//! - Zero leeway: a token is dead the second its expiry passes
//! - Credentials travel as `Basic <token>`; the scheme prefix is optional
//!   on input

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Role;

/// Authorization scheme prefix used on the wire.
pub const CREDENTIAL_SCHEME: &str = "Basic ";

/// Claims encoded into every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username of the session owner.
    pub sub: String,
    pub role: Role,
    /// Expiry, seconds since the unix epoch.
    pub exp: u64,
    pub iat: u64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credential is empty")]
    Empty,
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("session token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens.
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(signing_key: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
            ttl,
        }
    }

    /// Token lifetime applied by [`issue`](Self::issue).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a fresh token for `subject`.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, SessionError> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = SessionClaims {
            sub: subject.to_string(),
            role,
            exp: now + self.ttl.as_secs(),
            iat: now,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(SessionError::Sign)?;

        tracing::debug!(subject, %role, ttl_secs = self.ttl.as_secs(), "Session token issued");
        Ok(token)
    }

    /// Verify a credential as presented in the `authorization` metadata.
    pub fn verify(&self, credential: &str) -> Result<SessionClaims, SessionError> {
        let token = credential
            .strip_prefix(CREDENTIAL_SCHEME)
            .unwrap_or(credential)
            .trim();
        if token.is_empty() {
            return Err(SessionError::Empty);
        }

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(SessionError::Invalid)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-signing-key";

    fn manager() -> SessionManager {
        SessionManager::new(KEY, Duration::from_secs(300))
    }

    #[test]
    fn issued_token_verifies_with_and_without_scheme() {
        let sessions = manager();
        let token = sessions.issue("alice", Role::Admin).unwrap();

        let claims = sessions.verify(&format!("Basic {token}")).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);

        assert_eq!(sessions.verify(&token).unwrap().sub, "alice");
    }

    #[test]
    fn rejects_token_signed_with_other_key() {
        let token = SessionManager::new(b"other-key", Duration::from_secs(300))
            .issue("alice", Role::Admin)
            .unwrap();

        assert!(matches!(manager().verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = SessionClaims {
            sub: "alice".into(),
            role: Role::Normal,
            exp: now - 10,
            iat: now - 100,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(KEY)).unwrap();

        assert!(matches!(manager().verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn rejects_other_signing_algorithm() {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = SessionClaims {
            sub: "alice".into(),
            role: Role::Admin,
            exp: now + 300,
            iat: now,
        };
        let token = encode(&Header::new(Algorithm::HS384), &claims, &EncodingKey::from_secret(KEY)).unwrap();

        assert!(matches!(manager().verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn rejects_garbage_and_empty() {
        let sessions = manager();
        assert!(matches!(sessions.verify("Basic "), Err(SessionError::Empty)));
        assert!(matches!(sessions.verify("Basic not.a.jwt"), Err(SessionError::Invalid(_))));
    }
}
