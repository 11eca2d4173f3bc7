//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStore`], a thread-safe in-memory implementation of
//! [`super::KeyValueStore`]. Useful for unit and integration tests where
//! file I/O is undesirable.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{ExpenseError, Result};

use super::StoredValue;

/// Thread-safe in-memory key-value store.
///
/// # Example
///
/// ```rust
/// use expense_tracker::storage::{InMemoryStore, KeyValueStore, StoredValue};
///
/// let store = InMemoryStore::new();
/// store
///     .set_values(vec![("monthly_budget".to_owned(), StoredValue::Number(5000.0))])
///     .unwrap();
/// assert_eq!(store.number("monthly_budget").unwrap(), Some(5000.0));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// All entries behind a single mutex.
    inner: Mutex<BTreeMap<String, StoredValue>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn len(&self) -> Result<usize> {
        self.with_lock(|entries| entries.len())
    }

    /// Whether the store holds no keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn is_empty(&self) -> Result<bool> {
        self.with_lock(|entries| entries.is_empty())
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R>(&self, op: impl FnOnce(&mut BTreeMap<String, StoredValue>) -> R) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(op(&mut inner))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> ExpenseError {
    ExpenseError::Storage(err.to_string().into())
}

impl super::KeyValueStore for InMemoryStore {
    #[inline]
    fn value(&self, key: &str) -> Result<Option<StoredValue>> {
        self.with_lock(|entries| entries.get(key).cloned())
    }

    #[inline]
    fn set_values(&self, new_entries: Vec<(String, StoredValue)>) -> Result<()> {
        self.with_lock(|entries| {
            for (key, value) in new_entries {
                let _old = entries.insert(key, value);
            }
        })
    }
}
