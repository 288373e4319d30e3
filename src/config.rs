//! Database location.

use crate::error::{Result, TodoError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default database file.
pub const DB_ENV: &str = "TODO_DB";

/// Directory created under the platform data directory.
pub const APP_DIR: &str = "todo";

/// File name of the task store.
pub const DB_FILE: &str = "Todo.sqlite";

/// Path to the task store database file.
#[derive(Debug, Clone, PartialEq)]
pub struct DbPath {
    path: PathBuf,
}

impl DbPath {
    /// `<data dir>/todo/Todo.sqlite`
    pub fn default_path() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or(TodoError::NoDataDir)?;
        Ok(Self::in_data_dir(&data_dir))
    }

    fn in_data_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(APP_DIR).join(DB_FILE),
        }
    }

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Explicit path first, then `TODO_DB`, then the platform default.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        Self::resolve_with(explicit, std::env::var_os(DB_ENV))
    }

    fn resolve_with(explicit: Option<PathBuf>, env: Option<OsString>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        match env.filter(|v| !v.is_empty()) {
            Some(value) => Ok(Self::new(PathBuf::from(value))),
            None => Self::default_path(),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
