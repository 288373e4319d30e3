use std::path::PathBuf;
use thiserror::Error;

/// All possible errors in the todo store
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Cannot create data directory {}: {source}", .path.display())]
    StoreDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open database {}: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create todos table: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("Statement failed ({op}): {source}")]
    Statement {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot close database: {0}")]
    Close(#[source] rusqlite::Error),

    #[error("No platform data directory available. Pass --db or set TODO_DB.")]
    NoDataDir,

    #[error("Database lock poisoned by a panicked thread")]
    LockPoisoned,

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Id prefix '{prefix}' is ambiguous: {matches}", matches = .matches.join(", "))]
    AmbiguousId {
        prefix: String,
        matches: Vec<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TodoError {
    /// Wraps a rusqlite failure for the named repository operation.
    pub(crate) fn statement(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| TodoError::Statement { op, source }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TodoError>;
