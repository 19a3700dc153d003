//! Generic keyed table.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("record `{0}` already exists")]
    AlreadyExists(String),
    #[error("record `{0}` conflicts with an existing record")]
    Conflict(String),
    #[error("record `{0}` not found")]
    NotFound(String),
}

/// A row that can live in a [`Table`].
pub trait Record: Clone + Send + Sync + 'static {
    fn key(&self) -> &str;

    /// Secondary uniqueness rule between two distinct rows.
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }
}

/// One page of rows plus the offset the next page starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<usize>,
}

struct Rows<T> {
    slots: Vec<Option<T>>,
    index: HashMap<String, usize>,
}

pub struct Table<T> {
    rows: RwLock<Rows<T>>,
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                slots: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Rows<T>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Rows<T>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, row: T) -> Result<(), StorageError> {
        let mut rows = self.write();
        if rows.index.contains_key(row.key()) {
            return Err(StorageError::AlreadyExists(row.key().to_string()));
        }
        if rows.slots.iter().flatten().any(|other| row.conflicts_with(other)) {
            return Err(StorageError::Conflict(row.key().to_string()));
        }

        let position = rows.slots.len();
        rows.index.insert(row.key().to_string(), position);
        rows.slots.push(Some(row));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let rows = self.read();
        rows.index
            .get(key)
            .and_then(|&position| rows.slots[position].clone())
    }

    /// First row matching `predicate`, in insertion order.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.read().slots.iter().flatten().find(|row| predicate(row)).cloned()
    }

    /// Apply `change` to the row stored under `key` and return the result.
    ///
    /// The key itself cannot change; the edited row must not conflict with
    /// any other row.
    pub fn update(&self, key: &str, change: impl FnOnce(&mut T)) -> Result<T, StorageError> {
        self.try_update(key, |row| {
            change(row);
            Ok::<_, StorageError>(())
        })
    }

    /// Like [`Table::update`], but `change` may reject the edit. The stored
    /// row is left untouched on any error, and the write lock is held for
    /// the whole read-modify-write.
    pub fn try_update<E>(&self, key: &str, change: impl FnOnce(&mut T) -> Result<(), E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut rows = self.write();
        let position = *rows
            .index
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let mut edited = rows.slots[position]
            .clone()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        change(&mut edited)?;

        if edited.key() != key {
            return Err(StorageError::Conflict(key.to_string()).into());
        }
        let conflict = rows
            .slots
            .iter()
            .enumerate()
            .any(|(i, other)| i != position && other.as_ref().is_some_and(|other| edited.conflicts_with(other)));
        if conflict {
            return Err(StorageError::Conflict(key.to_string()).into());
        }

        rows.slots[position] = Some(edited.clone());
        Ok(edited)
    }

    pub fn remove(&self, key: &str) -> Result<T, StorageError> {
        let mut rows = self.write();
        let position = rows
            .index
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        rows.slots[position]
            .take()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Up to `limit` live rows starting at slot `offset`.
    pub fn page(&self, offset: usize, limit: usize) -> Page<T> {
        let rows = self.read();
        let mut items = Vec::with_capacity(limit.min(rows.slots.len()));
        let mut position = offset;

        while position < rows.slots.len() && items.len() < limit {
            if let Some(row) = &rows.slots[position] {
                items.push(row.clone());
            }
            position += 1;
        }

        let more = rows.slots.iter().skip(position).any(Option::is_some);
        Page {
            items,
            next: more.then_some(position),
        }
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: String,
        tag: String,
    }

    impl Record for Row {
        fn key(&self) -> &str {
            &self.key
        }

        fn conflicts_with(&self, other: &Self) -> bool {
            self.tag == other.tag
        }
    }

    fn row(key: &str, tag: &str) -> Row {
        Row {
            key: key.into(),
            tag: tag.into(),
        }
    }

    #[test]
    fn insert_enforces_key_and_conflicts() {
        let table = Table::new();
        table.insert(row("a", "x")).unwrap();
        assert_eq!(table.insert(row("a", "y")), Err(StorageError::AlreadyExists("a".into())));
        assert_eq!(table.insert(row("b", "x")), Err(StorageError::Conflict("b".into())));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn update_checks_conflicts_against_other_rows() {
        let table = Table::new();
        table.insert(row("a", "x")).unwrap();
        table.insert(row("b", "y")).unwrap();

        assert_eq!(table.update("a", |r| r.tag = "x".into()).unwrap(), row("a", "x"));
        assert!(matches!(table.update("a", |r| r.tag = "y".into()), Err(StorageError::Conflict(_))));
        assert!(matches!(table.update("zz", |_| {}), Err(StorageError::NotFound(_))));
        assert!(matches!(table.update("a", |r| r.key = "c".into()), Err(StorageError::Conflict(_))));
    }

    #[test]
    fn rejected_edits_leave_the_row_alone() {
        let table = Table::new();
        table.insert(row("a", "x")).unwrap();

        let rejected = table.try_update("a", |r| {
            r.tag = "changed".into();
            Err(Rejected::Invalid)
        });
        assert_eq!(rejected, Err(Rejected::Invalid));
        assert_eq!(table.get("a"), Some(row("a", "x")));

        let missing = table.try_update("zz", |_| Ok::<_, Rejected>(()));
        assert_eq!(missing, Err(Rejected::Storage(StorageError::NotFound("zz".into()))));
    }

    #[derive(Debug, PartialEq)]
    enum Rejected {
        Invalid,
        Storage(StorageError),
    }

    impl From<StorageError> for Rejected {
        fn from(err: StorageError) -> Self {
            Rejected::Storage(err)
        }
    }

    #[test]
    fn pages_skip_tombstones_without_shifting_offsets() {
        let table = Table::new();
        for i in 0..5 {
            table.insert(row(&format!("k{i}"), &format!("t{i}"))).unwrap();
        }

        let first = table.page(0, 2);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next, Some(2));

        table.remove("k2").unwrap();
        let second = table.page(2, 2);
        assert_eq!(
            second.items.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            vec!["k3", "k4"]
        );
        assert_eq!(second.next, None);

        assert!(table.get("k2").is_none());
        assert_eq!(table.remove("k2"), Err(StorageError::NotFound("k2".into())));
    }

    #[test]
    fn no_next_page_when_only_tombstones_remain() {
        let table = Table::new();
        for key in ["a", "b", "c"] {
            table.insert(row(key, key)).unwrap();
        }
        table.remove("c").unwrap();
        assert_eq!(table.page(0, 2).next, None);
        assert!(table.page(7, 2).items.is_empty());
    }
}
