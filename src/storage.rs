//! Pluggable key-value storage for the ledger and the widget snapshot.
//!
//! Both the app's private preferences and the region shared with the
//! widget are flat maps from a stable key to either a number or a list of
//! numbers. [`KeyValueStore`] abstracts over where that map lives:
//! [`FileStore`] keeps it in a JSON file, [`InMemoryStore`] in memory for
//! tests.

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStore;
pub use memory::InMemoryStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Stable key names shared by the writer and the readers.
pub mod keys {
    /// Private: running total of active entries.
    pub const SAVED_EXPENSES: &str = "saved_expenses";
    /// Private: configured monthly budget.
    pub const MONTHLY_BUDGET: &str = "monthly_budget";
    /// Private: entry amounts in chronological order.
    pub const EXPENSE_HISTORY: &str = "expense_history";
    /// Shared: total mirrored for the widget.
    pub const WIDGET_TOTAL_EXPENSES: &str = "widget_total_expenses";
    /// Shared: budget mirrored for the widget.
    pub const WIDGET_MONTHLY_BUDGET: &str = "widget_monthly_budget";
}

/// Identifier of the storage region visible to both the app and the
/// widget.
pub const APP_GROUP: &str = "group.expense-tracker.shared";

/// Name of the app's private preferences store.
pub const PRIVATE_STORE: &str = "preferences";

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// A scalar amount.
    Number(f64),
    /// An ordered list of amounts.
    List(Vec<f64>),
}

/// Blocking key-value backend.
///
/// All methods take `&self`; implementations use interior mutability
/// (e.g. `Mutex`) for thread-safe mutation.
pub trait KeyValueStore: core::fmt::Debug + Send + Sync {
    /// Returns the value stored under `key`, or `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn value(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Writes all `entries` in one step, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn set_values(&self, entries: Vec<(String, StoredValue)>) -> Result<()>;

    /// Returns the scalar under `key`.
    ///
    /// A list stored under a scalar key is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    fn number(&self, key: &str) -> Result<Option<f64>> {
        Ok(match self.value(key)? {
            Some(StoredValue::Number(number)) => Some(number),
            Some(StoredValue::List(_)) => {
                tracing::warn!(key, "expected a number, found a list");
                None
            }
            None => None,
        })
    }

    /// Returns the list under `key`.
    ///
    /// A scalar stored under a list key is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    fn numbers(&self, key: &str) -> Result<Option<Vec<f64>>> {
        Ok(match self.value(key)? {
            Some(StoredValue::List(list)) => Some(list),
            Some(StoredValue::Number(_)) => {
                tracing::warn!(key, "expected a list, found a number");
                None
            }
            None => None,
        })
    }
}
