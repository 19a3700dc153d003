//! Sessions: `auth.AuthService`.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tonic::Status;

use crate::proto::auth::{LoginRequest, LoginResponse, LogoutRequest, LogoutResponse};
use crate::security::{Caller, SessionManager};
use crate::storage::UserDirectory;

use super::blocking;

const BAD_CREDENTIALS: &str = "incorrect username/password";
const DECOY_PASSWORD: &str = "decoy-password";

pub struct LoginService {
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<SessionManager>,
    password_cost: u32,
    /// Hash verified for unknown users, at the same cost as stored passwords.
    decoy: OnceCell<String>,
}

impl LoginService {
    pub fn new(directory: Arc<dyn UserDirectory>, sessions: Arc<SessionManager>, password_cost: u32) -> Self {
        Self {
            directory,
            sessions,
            password_cost,
            decoy: OnceCell::new(),
        }
    }

    async fn decoy_hash(&self) -> Result<String, Status> {
        let cost = self.password_cost;
        self.decoy
            .get_or_try_init(|| blocking(move || bcrypt::hash(DECOY_PASSWORD, cost)))
            .await
            .cloned()
    }

    /// Exchange username and password for a session token.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn login(&self, _caller: Caller, request: LoginRequest) -> Result<LoginResponse, Status> {
        let Some(user) = self.directory.find_user(&request.username) else {
            let hash = self.decoy_hash().await?;
            blocking(move || bcrypt::verify(request.password, &hash)).await?;
            tracing::debug!(username = %request.username, "Login for unknown user");
            return Err(Status::invalid_argument(BAD_CREDENTIALS));
        };

        let hash = user.password_hash.clone();
        let matches = blocking(move || bcrypt::verify(request.password, &hash)).await?;
        if !matches {
            tracing::debug!(username = %user.username, "Login with wrong password");
            return Err(Status::invalid_argument(BAD_CREDENTIALS));
        }

        let access_token = self.sessions.issue(&user.username, user.role).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue session token");
            Status::internal("failed to issue session token")
        })?;

        tracing::info!(username = %user.username, role = %user.role, "User logged in");
        Ok(LoginResponse { access_token })
    }

    /// Tokens are self-contained; logging out only acknowledges the caller.
    pub async fn logout(&self, caller: Caller, _request: LogoutRequest) -> Result<LogoutResponse, Status> {
        let username = caller.username().unwrap_or_default().to_string();
        tracing::info!(%username, "User logged out");
        Ok(LogoutResponse { username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Role;
    use crate::storage::{UserRecord, UserStore};
    use std::time::Duration;
    use tonic::Code;

    fn service() -> (LoginService, Arc<SessionManager>) {
        let users = Arc::new(UserStore::new());
        users
            .insert(UserRecord {
                username: "gina".into(),
                email: "gina@example.com".into(),
                password_hash: bcrypt::hash("correct horse", 4).unwrap(),
                role: Role::Subscribed,
                first_name: String::new(),
                last_name: String::new(),
                active: true,
                create_time: 0,
                update_time: 0,
            })
            .unwrap();
        let sessions = Arc::new(SessionManager::new(b"login-test", Duration::from_secs(60)));
        (LoginService::new(users, Arc::clone(&sessions), 4), sessions)
    }

    fn request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_issues_token_carrying_stored_role() {
        let (svc, sessions) = service();
        let response = svc.login(Caller::Guest, request("gina", "correct horse")).await.unwrap();

        let claims = sessions.verify(&response.access_token).unwrap();
        assert_eq!(claims.sub, "gina");
        assert_eq!(claims.role, Role::Subscribed);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let (svc, _) = service();
        let unknown = svc.login(Caller::Guest, request("nobody", "x")).await.unwrap_err();
        let wrong = svc.login(Caller::Guest, request("gina", "x")).await.unwrap_err();

        assert_eq!(unknown.code(), Code::InvalidArgument);
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.message(), wrong.message());
    }

    #[tokio::test]
    async fn unknown_users_still_pay_for_a_password_check() {
        let (svc, _) = service();
        assert!(svc.decoy.get().is_none());

        svc.login(Caller::Guest, request("nobody", "x")).await.unwrap_err();
        let decoy = svc.decoy.get().cloned().unwrap();
        assert!(decoy.starts_with("$2b$04$"));

        // cached after the first miss
        svc.login(Caller::Guest, request("someone", "y")).await.unwrap_err();
        assert_eq!(svc.decoy.get(), Some(&decoy));
    }
}
