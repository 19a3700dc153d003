//! In-memory persistence.
//!
//! # Responsibilities
//! - Keyed tables with stable insertion order for offset pagination
//! - Uniqueness checks (primary key plus per-record conflicts) under one lock
//! - The `UserDirectory` read path used at login
//!
//! # Design Decisions
//! - Deleted rows leave a tombstone so outstanding page offsets stay valid
//! - Reads clone rows out; no lock is held beyond a single operation

mod table;
mod users;

pub use table::{Page, Record, StorageError, Table};
pub use users::{UserDirectory, UserRecord, UserStore};

use crate::proto::movie::Movie;

impl Record for Movie {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Movie catalog storage.
pub type MovieStore = Table<Movie>;
