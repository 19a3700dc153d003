//! User accounts.

use crate::proto::identity::User;
use crate::security::Role;

use super::table::{Record, Table};

/// Stored account; unlike the wire `User`, carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub create_time: i64,
    pub update_time: i64,
}

impl UserRecord {
    /// Wire form with the password blanked.
    pub fn to_user(&self) -> User {
        User {
            username: self.username.clone(),
            email: self.email.clone(),
            password: String::new(),
            role: self.role.into(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            active: self.active,
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

impl Record for UserRecord {
    fn key(&self) -> &str {
        &self.username
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.email.eq_ignore_ascii_case(&other.email)
    }
}

pub type UserStore = Table<UserRecord>;

/// Read path used when issuing session tokens.
pub trait UserDirectory: Send + Sync {
    fn find_user(&self, username: &str) -> Option<UserRecord>;
}

impl UserDirectory for UserStore {
    fn find_user(&self, username: &str) -> Option<UserRecord> {
        self.get(username).filter(|user| user.active)
    }
}
