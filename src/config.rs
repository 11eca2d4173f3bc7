//! Resolution of the private and shared storage locations.
//!
//! Precedence, highest first: explicit paths (CLI flags), environment
//! variables, platform defaults.

use std::path::PathBuf;

use crate::error::{ExpenseError, Result};
use crate::storage::{APP_GROUP, FileStore, PRIVATE_STORE};

/// Environment variable overriding the private data directory.
pub const DATA_DIR_ENV: &str = "EXPENSE_TRACKER_DATA_DIR";
/// Environment variable overriding the shared (widget) directory.
pub const SHARED_DIR_ENV: &str = "EXPENSE_TRACKER_SHARED_DIR";
/// Sub-directory of the data directory used for the shared region by
/// default.
const SHARED_SUBDIR: &str = "shared";

/// Where the app and widget keep their stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory of the private preferences store.
    pub data_dir: PathBuf,
    /// Directory of the store shared with the widget.
    pub shared_dir: PathBuf,
}

impl Config {
    /// Resolves the configuration from explicit overrides and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory was given and the platform
    /// default cannot be determined.
    #[inline]
    pub fn resolve(data_dir: Option<PathBuf>, shared_dir: Option<PathBuf>) -> Result<Self> {
        Self::resolve_with(data_dir, shared_dir, |name| std::env::var_os(name).map(PathBuf::from))
    }

    /// Like [`Config::resolve`], reading variables through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory was given and the platform
    /// default cannot be determined.
    #[inline]
    pub fn resolve_with<F>(
        data_dir: Option<PathBuf>,
        shared_dir: Option<PathBuf>,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let data_dir = match data_dir.or_else(|| non_empty(env(DATA_DIR_ENV))) {
            Some(dir) => dir,
            None => FileStore::default_dir().map_err(|err| {
                ExpenseError::Config(format!("no data directory configured: {err}"))
            })?,
        };
        let shared_dir = shared_dir
            .or_else(|| non_empty(env(SHARED_DIR_ENV)))
            .unwrap_or_else(|| data_dir.join(SHARED_SUBDIR));
        tracing::debug!(
            data_dir = %data_dir.display(),
            shared_dir = %shared_dir.display(),
            "resolved storage locations"
        );
        Ok(Self {
            data_dir,
            shared_dir,
        })
    }

    /// Opens the app's private store.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[inline]
    pub fn open_private(&self) -> Result<FileStore> {
        FileStore::new(&self.data_dir, PRIVATE_STORE)
    }

    /// Opens the region shared with the widget.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[inline]
    pub fn open_shared(&self) -> Result<FileStore> {
        FileStore::new(&self.shared_dir, APP_GROUP)
    }
}

/// Treats an empty path as unset.
fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|candidate| !candidate.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_name: &str) -> Option<PathBuf> {
        None
    }

    #[test]
    fn explicit_paths_win() {
        let config = Config::resolve_with(
            Some(PathBuf::from("/tmp/data")),
            Some(PathBuf::from("/tmp/group")),
            |_| Some(PathBuf::from("/ignored")),
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.shared_dir, PathBuf::from("/tmp/group"));
    }

    #[test]
    fn environment_is_used_when_no_flags() {
        let config = Config::resolve_with(None, None, |name| match name {
            DATA_DIR_ENV => Some(PathBuf::from("/env/data")),
            SHARED_DIR_ENV => Some(PathBuf::from("/env/shared")),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/env/data"));
        assert_eq!(config.shared_dir, PathBuf::from("/env/shared"));
    }

    #[test]
    fn shared_defaults_under_data_dir() {
        let config = Config::resolve_with(Some(PathBuf::from("/d")), None, no_env).unwrap();
        assert_eq!(config.shared_dir, PathBuf::from("/d/shared"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = Config::resolve_with(Some(PathBuf::from("/d")), None, |_| {
            Some(PathBuf::new())
        })
        .unwrap();
        assert_eq!(config.shared_dir, PathBuf::from("/d/shared"));
    }

    #[test]
    fn stores_open_in_configured_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve_with(Some(dir.path().to_path_buf()), None, no_env).unwrap();
        let private = config.open_private().unwrap();
        let shared = config.open_shared().unwrap();
        assert_eq!(private.path(), dir.path().join("preferences.json"));
        assert_eq!(
            shared.path(),
            dir.path().join("shared").join(format!("{APP_GROUP}.json"))
        );
    }
}
