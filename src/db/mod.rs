//! Storage handle: one SQLite file, one connection.

pub mod schema;

use crate::config::DbPath;
use crate::error::{Result, TodoError};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Database handle
///
/// The connection sits behind a single mutex so a `&Database` can be shared
/// across threads; each repository call holds the lock for one statement.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at the resolved default location
    pub fn open_default() -> Result<Self> {
        let path = DbPath::resolve(None)?;
        Self::open(path.as_path())
    }

    /// Open (or create) the database file and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| TodoError::StoreDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| TodoError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        schema::init(&conn).map_err(TodoError::Schema)?;

        info!(path = %path.display(), "opened task store");
        Ok(Database {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| TodoError::StoreUnavailable {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        schema::init(&conn).map_err(TodoError::Schema)?;

        Ok(Database {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// File backing this handle, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check that the todos table is present
    pub fn is_initialized(&self) -> Result<bool> {
        let conn = self.lock()?;
        schema::is_initialized(&conn).map_err(TodoError::Schema)
    }

    /// Lock the connection for one statement
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| TodoError::LockPoisoned)
    }

    /// Close the connection, reporting any failure instead of ignoring it on drop
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|_| TodoError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| TodoError::Close(e))?;
        debug!("closed task store");
        Ok(())
    }
}
