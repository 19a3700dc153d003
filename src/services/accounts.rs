//! User accounts: `identity.IdentityService`.

use std::sync::Arc;

use tonic::Status;

use crate::pagination::PageTokenCodec;
use crate::proto::identity::{
    CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUsersRequest, ListUsersResponse, UpdateUserRequest,
    User,
};
use crate::proto::Empty;
use crate::security::{Caller, Role};
use crate::storage::{UserRecord, UserStore};

use super::{blocking, unix_now, PageLimits};

pub struct AccountService {
    users: Arc<UserStore>,
    pages: PageTokenCodec,
    limits: PageLimits,
    password_cost: u32,
}

fn validate_username(username: &str) -> Result<(), Status> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if username.is_empty() || username.len() > 64 || !valid_chars {
        return Err(Status::invalid_argument(
            "username must be 1-64 characters of letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), Status> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(Status::invalid_argument("email address is invalid")),
    }
}

/// Role carried by a request. The wire default (0, GUEST) means "not set":
/// accounts are never stored as GUEST.
fn requested_role(value: i32) -> Result<Option<Role>, Status> {
    match Role::try_from(value) {
        Ok(Role::Guest) => Ok(None),
        Ok(role) => Ok(Some(role)),
        Err(_) => Err(Status::invalid_argument("role is invalid")),
    }
}

/// Non-admins may only act on their own account.
fn ensure_self_or_admin(caller: &Caller, username: &str) -> Result<(), Status> {
    if caller.is_admin() || caller.username() == Some(username) {
        Ok(())
    } else {
        Err(Status::permission_denied("not allowed to access this feature"))
    }
}

impl AccountService {
    pub fn new(users: Arc<UserStore>, pages: PageTokenCodec, limits: PageLimits, password_cost: u32) -> Self {
        Self {
            users,
            pages,
            limits,
            password_cost,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, Status> {
        let cost = self.password_cost;
        blocking(move || bcrypt::hash(password, cost)).await
    }

    /// Create an account outside any call, e.g. from configuration.
    pub async fn provision(&self, user: User, role: Role) -> Result<User, Status> {
        validate_username(&user.username)?;
        validate_email(&user.email)?;
        if user.password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }

        let now = unix_now();
        let record = UserRecord {
            password_hash: self.hash_password(user.password).await?,
            username: user.username,
            email: user.email.trim().to_string(),
            role,
            first_name: user.first_name,
            last_name: user.last_name,
            active: true,
            create_time: now,
            update_time: now,
        };
        let created = record.to_user();
        self.users.insert(record)?;

        tracing::info!(username = %created.username, %role, "User created");
        Ok(created)
    }

    pub async fn create_user(&self, caller: Caller, request: CreateUserRequest) -> Result<User, Status> {
        let user = request
            .user
            .ok_or_else(|| Status::invalid_argument("user is required"))?;

        let role = if caller.is_admin() {
            requested_role(user.role)?.unwrap_or(Role::Normal)
        } else {
            Role::Normal
        };
        self.provision(user, role).await
    }

    pub async fn get_user(&self, caller: Caller, request: GetUserRequest) -> Result<User, Status> {
        ensure_self_or_admin(&caller, &request.username)?;
        self.users
            .get(&request.username)
            .map(|record| record.to_user())
            .ok_or_else(|| Status::not_found(format!("user `{}` not found", request.username)))
    }

    pub async fn update_user(&self, caller: Caller, request: UpdateUserRequest) -> Result<User, Status> {
        let user = request
            .user
            .ok_or_else(|| Status::invalid_argument("user is required"))?;
        ensure_self_or_admin(&caller, &user.username)?;

        if !user.email.is_empty() {
            validate_email(&user.email)?;
        }
        let role = if caller.is_admin() {
            requested_role(user.role)?
        } else {
            None
        };
        let password_hash = if user.password.is_empty() {
            None
        } else {
            Some(self.hash_password(user.password).await?)
        };

        let updated = self.users.update(&user.username, |record| {
            if !user.email.is_empty() {
                record.email = user.email.trim().to_string();
            }
            if !user.first_name.is_empty() {
                record.first_name = user.first_name;
            }
            if !user.last_name.is_empty() {
                record.last_name = user.last_name;
            }
            if let Some(hash) = password_hash {
                record.password_hash = hash;
            }
            if let Some(role) = role {
                record.role = role;
            }
            record.update_time = unix_now();
        })?;

        Ok(updated.to_user())
    }

    pub async fn delete_user(&self, caller: Caller, request: DeleteUserRequest) -> Result<Empty, Status> {
        ensure_self_or_admin(&caller, &request.username)?;
        self.users.remove(&request.username)?;
        tracing::info!(username = %request.username, "User deleted");
        Ok(Empty {})
    }

    pub async fn list_users(&self, _caller: Caller, request: ListUsersRequest) -> Result<ListUsersResponse, Status> {
        let size = self.limits.resolve(request.page_size)?;
        let offset = self.pages.get_index(&request.page_token)?;

        let page = self.users.page(offset, size);
        Ok(ListUsersResponse {
            users: page.items.iter().map(UserRecord::to_user).collect(),
            next_page_token: page
                .next
                .map(|next| self.pages.for_index(next))
                .unwrap_or_default(),
        })
    }
}
