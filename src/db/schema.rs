//! Table layout of the task store.

use rusqlite::Connection;

/// Name of the only table in the store.
pub const TABLE: &str = "todos";

/// Idempotent creation statement for the todos table.
///
/// Timestamps are epoch seconds; `completedAt` is NULL while a task is active.
pub const CREATE_TODOS: &str = "CREATE TABLE IF NOT EXISTS todos(
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    isCompleted INTEGER NOT NULL,
    createdAt REAL NOT NULL,
    completedAt REAL
)";

/// Ensure the todos table exists.
pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_TODOS, [])?;
    Ok(())
}

/// Check whether the todos table is present.
pub fn is_initialized(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [TABLE],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
