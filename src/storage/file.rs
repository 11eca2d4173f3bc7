//! JSON-file-based storage backend.
//!
//! Stores one key-value map per file under a configurable directory
//! (default: `$XDG_DATA_HOME/expense-tracker/`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{ExpenseError, Result};

use super::StoredValue;

/// Application name used for the XDG data directory.
const APP_NAME: &str = "expense-tracker";

/// Serialized form of a whole store.
type Blob = BTreeMap<String, StoredValue>;

/// File-backed store that persists its map as a single JSON object.
///
/// The app and the widget each open a `FileStore` on the same shared
/// file; the app is the only writer.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on a `<name>.lock` sentinel (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]).
///
/// Reads acquire a shared lock, writes an exclusive one. Writes go to a
/// temporary file which is then renamed over the original, so readers see
/// either the old or the new map.
///
/// # File layout
///
/// ```text
/// <dir>/
///   <name>.lock          (cross-process lock sentinel)
///   <name>.json
/// ```
#[derive(Debug)]
pub struct FileStore {
    /// Path of the JSON file holding the map.
    path: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStore {
    /// Opens (or prepares) the store `name` inside `dir`.
    ///
    /// Creates the directory (and parents) if it does not exist, and opens
    /// (or creates) the lock sentinel. The JSON file itself is only created
    /// on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(format!("{name}.lock")))
            .map_err(storage_io_error)?;
        Ok(Self {
            path: dir.join(format!("{name}.json")),
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/expense-tracker/` (typically
    /// `~/.local/share/expense-tracker/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                ExpenseError::Storage("could not determine platform data directory".into())
            })
    }

    /// Path of the JSON file backing this store.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded;
        // otherwise the original error is more useful.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads and deserializes the map. Returns an empty map if the file
    /// does not exist.
    fn read_blob(&self) -> Result<Blob> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(ExpenseError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Blob::new()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Reads the map before a write. A corrupt file is replaced rather
    /// than blocking every later write.
    fn read_blob_for_update(&self) -> Result<Blob> {
        match self.read_blob() {
            Err(ExpenseError::Serialization(err)) => {
                tracing::warn!(path = %self.path.display(), error = %err, "discarding corrupt store");
                Ok(Blob::new())
            }
            other => other,
        }
    }

    /// Atomically writes the map (write-to-tmp then rename).
    fn write_blob(&self, blob: &Blob) -> Result<()> {
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let json = serde_json::to_string_pretty(blob).map_err(ExpenseError::from)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(storage_io_error)?;
        Ok(())
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into an [`ExpenseError::Storage`].
fn storage_io_error(err: std::io::Error) -> ExpenseError {
    ExpenseError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into an [`ExpenseError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> ExpenseError {
    ExpenseError::Storage(err.to_string().into())
}

// ── KeyValueStore implementation ────────────────────────────────────────

impl super::KeyValueStore for FileStore {
    #[inline]
    fn value(&self, key: &str) -> Result<Option<StoredValue>> {
        self.with_shared_lock(|| {
            let mut blob = self.read_blob()?;
            Ok(blob.remove(key))
        })
    }

    #[inline]
    fn set_values(&self, entries: Vec<(String, StoredValue)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.with_exclusive_lock(|| {
            let mut blob = self.read_blob_for_update()?;
            blob.extend(entries);
            self.write_blob(&blob)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, keys};

    /// Helper to create a [`FileStore`] in a temporary directory.
    fn temp_store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "preferences").unwrap();
        (store, dir)
    }

    #[test]
    fn empty_store_returns_none() {
        let (store, _dir) = temp_store();
        assert!(store.value(keys::SAVED_EXPENSES).unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn set_and_read_back() {
        let (store, _dir) = temp_store();
        store
            .set_values(vec![
                (keys::SAVED_EXPENSES.to_owned(), StoredValue::Number(700.0)),
                (
                    keys::EXPENSE_HISTORY.to_owned(),
                    StoredValue::List(vec![300.0, 400.0]),
                ),
            ])
            .unwrap();
        assert_eq!(store.number(keys::SAVED_EXPENSES).unwrap(), Some(700.0));
        assert_eq!(
            store.numbers(keys::EXPENSE_HISTORY).unwrap(),
            Some(vec![300.0, 400.0])
        );
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path(), "preferences").unwrap();
            store
                .set_values(vec![(
                    keys::MONTHLY_BUDGET.to_owned(),
                    StoredValue::Number(12_000.0),
                )])
                .unwrap();
        }
        let reopened = FileStore::new(dir.path(), "preferences").unwrap();
        assert_eq!(reopened.number(keys::MONTHLY_BUDGET).unwrap(), Some(12_000.0));
    }

    #[test]
    fn two_handles_see_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileStore::new(dir.path(), "shared").unwrap();
        let reader = FileStore::new(dir.path(), "shared").unwrap();
        writer
            .set_values(vec![(
                keys::WIDGET_TOTAL_EXPENSES.to_owned(),
                StoredValue::Number(42.0),
            )])
            .unwrap();
        assert_eq!(reader.number(keys::WIDGET_TOTAL_EXPENSES).unwrap(), Some(42.0));
    }

    #[test]
    fn set_merges_with_existing_keys() {
        let (store, _dir) = temp_store();
        store
            .set_values(vec![("a".to_owned(), StoredValue::Number(1.0))])
            .unwrap();
        store
            .set_values(vec![("b".to_owned(), StoredValue::Number(2.0))])
            .unwrap();
        assert_eq!(store.number("a").unwrap(), Some(1.0));
        assert_eq!(store.number("b").unwrap(), Some(2.0));
    }

    #[test]
    fn file_is_plain_json_object() {
        let (store, _dir) = temp_store();
        store
            .set_values(vec![(keys::MONTHLY_BUDGET.to_owned(), StoredValue::Number(5_000.0))])
            .unwrap();
        let contents = fs::read_to_string(store.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed[keys::MONTHLY_BUDGET], serde_json::json!(5_000.0));
    }

    #[test]
    fn corrupt_file_surfaces_on_read() {
        let (store, _dir) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        let err = store.value(keys::SAVED_EXPENSES).unwrap_err();
        assert!(matches!(err, ExpenseError::Serialization(_)));
    }

    #[test]
    fn corrupt_file_is_replaced_on_write() {
        let (store, _dir) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        store
            .set_values(vec![(keys::SAVED_EXPENSES.to_owned(), StoredValue::Number(9.0))])
            .unwrap();
        assert_eq!(store.number(keys::SAVED_EXPENSES).unwrap(), Some(9.0));
    }

    #[test]
    fn lock_sentinel_sits_next_to_the_data() {
        let (store, dir) = temp_store();
        store
            .set_values(vec![("a".to_owned(), StoredValue::Number(1.0))])
            .unwrap();
        assert!(store.path().exists());
        assert!(dir.path().join("preferences.lock").exists());
    }

    #[test]
    fn new_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let _store = FileStore::new(&nested, "shared").unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(path) = FileStore::default_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }
}
