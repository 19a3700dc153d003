//! Business services behind the interceptor chain.
//!
//! # Services
//! ```text
//! AccountService  → identity.IdentityService  (storage::UserStore)
//! CatalogService  → movie.MovieService        (storage::MovieStore)
//! LoginService    → auth.AuthService          (UserDirectory + SessionManager)
//! PingService     → testing.TestService
//! ```
//!
//! Each method takes the admitted [`Caller`](crate::security::Caller) and the
//! wire request, and returns the wire response or a `tonic::Status`. Neither
//! transport appears here.

mod accounts;
mod catalog;
mod login;
mod ping;

use std::time::{SystemTime, UNIX_EPOCH};

use tonic::Status;

use crate::storage::StorageError;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use login::LoginService;
pub use ping::PingService;

/// Page size bounds for list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: usize,
    pub max_size: usize,
}

impl PageLimits {
    /// Effective page size for a requested `page_size` field.
    pub fn resolve(&self, requested: i32) -> Result<usize, Status> {
        match requested {
            n if n < 0 => Err(Status::invalid_argument("The field `page_size` must not be negative.")),
            0 => Ok(self.default_size),
            n => Ok((n as usize).min(self.max_size)),
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 100,
        }
    }
}

impl From<StorageError> for Status {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::AlreadyExists(_) | StorageError::Conflict(_) => Status::already_exists(err.to_string()),
            StorageError::NotFound(_) => Status::not_found(err.to_string()),
        }
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

/// Run CPU-heavy password work off the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, Status>
where
    F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Status::internal(format!("password worker failed: {e}")))?
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            Status::internal("password hashing failed")
        })
}
