//! Typed CRUD over the todos table.

use crate::db::Database;
use crate::error::{Result, TodoError};
use crate::models::{self, SkippedRow, Snapshot, Task, TaskId};
use rusqlite::Row;
use rusqlite::types::ValueRef;
use tracing::{debug, warn};

const SELECT_COLUMNS: &str = "SELECT id, title, isCompleted, createdAt, completedAt FROM todos";

/// Stateless façade over a borrowed [`Database`]
#[derive(Clone, Copy)]
pub struct TodoRepository<'a> {
    db: &'a Database,
}

impl<'a> TodoRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        TodoRepository { db }
    }

    // ==================== Reads ====================

    /// All decodable tasks in storage order. Skipped rows are logged.
    pub fn list_all(&self) -> Result<Vec<Task>> {
        let snapshot = self.snapshot()?;
        if !snapshot.skipped.is_empty() {
            warn!(
                skipped = snapshot.skipped.len(),
                "ignored rows that could not be decoded"
            );
        }
        Ok(snapshot.tasks)
    }

    /// Full table read, keeping track of rows that failed to decode
    pub fn snapshot(&self) -> Result<Snapshot> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(SELECT_COLUMNS)
            .map_err(TodoError::statement("list"))?;

        let rows = stmt
            .query_map([], decode_row)
            .map_err(TodoError::statement("list"))?;

        let mut snapshot = Snapshot::default();
        for row in rows {
            match row.map_err(TodoError::statement("list"))? {
                Ok(task) => snapshot.tasks.push(task),
                Err(skipped) => {
                    debug!(raw_id = %skipped.raw_id, reason = %skipped.reason, "skipping row");
                    snapshot.skipped.push(skipped);
                }
            }
        }
        Ok(snapshot)
    }

    /// Look up a single task
    pub fn find(&self, id: TaskId) -> Result<Option<Task>> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1 COLLATE NOCASE"))
            .map_err(TodoError::statement("find"))?;

        let mut rows = stmt
            .query_map([id], decode_row)
            .map_err(TodoError::statement("find"))?;

        match rows.next() {
            Some(row) => Ok(row.map_err(TodoError::statement("find"))?.ok()),
            None => Ok(None),
        }
    }

    // ==================== Writes ====================

    /// Insert a new active task. The title is stored as given.
    pub fn insert(&self, title: &str) -> Result<Task> {
        let task = Task {
            id: TaskId::new(),
            title: title.to_string(),
            is_completed: false,
            created_at: models::now(),
            completed_at: None,
        };

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO todos (id, title, isCompleted, createdAt, completedAt)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                task.id,
                &task.title,
                task.is_completed,
                models::to_epoch_seconds(task.created_at),
                None::<f64>,
            ),
        )
        .map_err(TodoError::statement("insert"))?;

        debug!(id = %task.id, "inserted task");
        Ok(task)
    }

    /// Replace the title. Returns whether a row matched.
    pub fn update_title(&self, id: TaskId, title: &str) -> Result<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute("UPDATE todos SET title = ?1 WHERE id = ?2 COLLATE NOCASE", (title, id))
            .map_err(TodoError::statement("update_title"))?;

        debug!(%id, changed, "updated title");
        Ok(changed > 0)
    }

    /// Set the completion flag and its timestamp in one statement.
    /// Returns whether a row matched.
    pub fn toggle_completed(&self, id: TaskId, is_completed: bool) -> Result<bool> {
        let completed_at = is_completed.then(|| models::to_epoch_seconds(models::now()));

        let conn = self.db.lock()?;
        let changed = conn
            .execute(
                "UPDATE todos SET isCompleted = ?1, completedAt = ?2 WHERE id = ?3 COLLATE NOCASE",
                (is_completed, completed_at, id),
            )
            .map_err(TodoError::statement("toggle_completed"))?;

        debug!(%id, is_completed, changed, "toggled completion");
        Ok(changed > 0)
    }

    /// Hard delete. Returns whether a row matched.
    pub fn delete(&self, id: TaskId) -> Result<bool> {
        let conn = self.db.lock()?;
        let changed = conn
            .execute("DELETE FROM todos WHERE id = ?1 COLLATE NOCASE", [id])
            .map_err(TodoError::statement("delete"))?;

        debug!(%id, changed, "deleted task");
        Ok(changed > 0)
    }
}

// ==================== Row Decoding ====================

/// Decode one row. The outer error is a storage failure; the inner one marks
/// a row whose contents cannot form a [`Task`].
fn decode_row(row: &Row) -> rusqlite::Result<std::result::Result<Task, SkippedRow>> {
    let raw_id = match row.get_ref(0)? {
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => {
            return Ok(Err(SkippedRow {
                raw_id: format!("{other:?}"),
                reason: "id is not text".to_string(),
            }));
        }
    };

    let skip = |reason: &str| SkippedRow {
        raw_id: raw_id.clone(),
        reason: reason.to_string(),
    };

    // Only the hyphenated form, in either case, can be matched again by
    // `WHERE id = ? COLLATE NOCASE`
    let id = match raw_id.parse::<TaskId>() {
        Ok(id) if id.to_string().eq_ignore_ascii_case(&raw_id) => id,
        _ => return Ok(Err(skip("id is not a valid identifier"))),
    };

    let title = match row.get_ref(1)? {
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(title) => title.to_string(),
            Err(_) => return Ok(Err(skip("title is not valid UTF-8"))),
        },
        _ => return Ok(Err(skip("title is not text"))),
    };

    let is_completed = match row.get_ref(2)? {
        ValueRef::Integer(flag) => flag == 1,
        _ => return Ok(Err(skip("isCompleted is not an integer"))),
    };

    let Some(created_at) = epoch_seconds(row.get_ref(3)?).and_then(models::from_epoch_seconds)
    else {
        return Ok(Err(skip("createdAt is not a valid timestamp")));
    };

    // NULL means "not completed"; 0.0 is a real timestamp
    let completed_at = match row.get_ref(4)? {
        ValueRef::Null => None,
        value => match epoch_seconds(value).and_then(models::from_epoch_seconds) {
            Some(t) => Some(t),
            None => return Ok(Err(skip("completedAt is not a valid timestamp"))),
        },
    };

    Ok(Ok(Task {
        id,
        title,
        is_completed,
        created_at,
        completed_at,
    }))
}

fn epoch_seconds(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Real(secs) => Some(secs),
        ValueRef::Integer(secs) => Some(secs as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.sqlite")).unwrap();
        (db, temp_dir)
    }

    fn raw_insert(db: &Database, id: &str, completed: i64, created: f64, done: Option<f64>) {
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO todos (id, title, isCompleted, createdAt, completedAt)
                 VALUES (?1, 'raw', ?2, ?3, ?4)",
                (id, completed, created, done),
            )
            .unwrap();
    }

    #[test]
    fn test_insert_creates_active_task() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let task = repo.insert("Write report").unwrap();
        let tasks = repo.list_all().unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0], task);
        assert_eq!(tasks[0].title, "Write report");
        assert!(!tasks[0].is_completed);
        assert!(tasks[0].completed_at.is_none());
    }

    #[test]
    fn test_buy_milk_scenario() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let id = repo.insert("Buy milk").unwrap().id;
        let tasks = repo.list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert!(!tasks[0].is_completed);

        assert!(repo.toggle_completed(id, true).unwrap());
        let task = repo.find(id).unwrap().unwrap();
        assert!(task.is_completed);
        assert!(task.completed_at.unwrap() >= task.created_at);

        assert!(repo.toggle_completed(id, false).unwrap());
        let task = repo.find(id).unwrap().unwrap();
        assert!(!task.is_completed);
        assert!(task.completed_at.is_none());

        assert!(repo.delete(id).unwrap());
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_completion_invariant_holds_through_mutations() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let ids: Vec<TaskId> = (0..5)
            .map(|i| repo.insert(&format!("Task {i}")).unwrap().id)
            .collect();

        repo.toggle_completed(ids[0], true).unwrap();
        repo.toggle_completed(ids[1], true).unwrap();
        repo.toggle_completed(ids[1], false).unwrap();
        repo.toggle_completed(ids[2], false).unwrap();
        repo.update_title(ids[0], "renamed while done").unwrap();
        repo.toggle_completed(ids[3], true).unwrap();
        repo.toggle_completed(ids[3], true).unwrap();

        for task in repo.list_all().unwrap() {
            assert!(task.is_consistent(), "inconsistent: {task:?}");
        }
    }

    #[test]
    fn test_quotes_round_trip() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let title = "O'Brien's task; DROP TABLE todos; --\"";
        let id = repo.insert(title).unwrap().id;
        assert_eq!(repo.list_all().unwrap()[0].title, title);

        let renamed = "it's \"quoted\" again";
        repo.update_title(id, renamed).unwrap();
        assert_eq!(repo.find(id).unwrap().unwrap().title, renamed);
    }

    #[test]
    fn test_update_title_only_touches_title() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let id = repo.insert("Old").unwrap().id;
        repo.toggle_completed(id, true).unwrap();
        let before = repo.find(id).unwrap().unwrap();

        assert!(repo.update_title(id, "New").unwrap());
        let after = repo.find(id).unwrap().unwrap();

        assert_eq!(after.title, "New");
        assert_eq!(after.is_completed, before.is_completed);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.completed_at, before.completed_at);
    }

    #[test]
    fn test_missing_id_is_a_no_op() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);
        repo.insert("Keep me").unwrap();
        let before = repo.list_all().unwrap();

        let ghost = TaskId::new();
        assert!(!repo.update_title(ghost, "nope").unwrap());
        assert!(!repo.toggle_completed(ghost, true).unwrap());
        assert!(!repo.delete(ghost).unwrap());
        assert!(repo.find(ghost).unwrap().is_none());

        assert_eq!(repo.list_all().unwrap(), before);
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let a = repo.insert("A").unwrap().id;
        let b = repo.insert("B").unwrap().id;
        let c = repo.insert("C").unwrap().id;

        assert!(repo.delete(b).unwrap());
        let remaining: Vec<TaskId> = repo.list_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&a));
        assert!(remaining.contains(&c));
        assert!(!remaining.contains(&b));
    }

    #[test]
    fn test_list_keeps_storage_order() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);

        let inserted: Vec<TaskId> = ["first", "second", "third"]
            .iter()
            .map(|t| repo.insert(t).unwrap().id)
            .collect();
        let listed: Vec<TaskId> = repo.list_all().unwrap().iter().map(|t| t.id).collect();

        // Text primary key tables keep an implicit rowid, scanned in insert order
        assert_eq!(listed, inserted);
    }

    #[test]
    fn test_zero_completed_at_is_not_absent() {
        let (db, _temp) = setup();
        let id = TaskId::new().to_string();
        raw_insert(&db, &id, 1, 0.0, Some(0.0));

        let tasks = TodoRepository::new(&db).list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_completed);
        assert_eq!(tasks[0].completed_at.map(|t| t.timestamp()), Some(0));
    }

    #[test]
    fn test_lower_case_ids_are_accepted() {
        let (db, _temp) = setup();
        let id = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        raw_insert(&db, id, 0, 1_700_000_000.5, None);

        let repo = TodoRepository::new(&db);
        let tasks = repo.list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.to_string(), id.to_uppercase());

        let listed = tasks[0].id;
        assert!(repo.update_title(listed, "renamed").unwrap());
        assert!(repo.toggle_completed(listed, true).unwrap());
        let task = repo.find(listed).unwrap().unwrap();
        assert_eq!(task.title, "renamed");
        assert!(task.is_completed);

        assert!(repo.delete(listed).unwrap());
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_non_canonical_id_forms_are_skipped() {
        let (db, _temp) = setup();
        raw_insert(&db, " 6F9619FF-8B86-D011-B42D-00C04FC964FF ", 0, 1.0, None);
        raw_insert(&db, "6F9619FF8B86D011B42D00C04FC964FF", 0, 1.0, None);

        let snapshot = TodoRepository::new(&db).snapshot().unwrap();
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.skipped.len(), 2);
    }

    fn insert_bad_row(db: &Database, title: &str, completed: &str, created: &str, done: &str) {
        let sql = format!(
            "INSERT INTO todos (id, title, isCompleted, createdAt, completedAt)
             VALUES (?1, {title}, {completed}, {created}, {done})"
        );
        db.lock()
            .unwrap()
            .execute(&sql, [TaskId::new()])
            .unwrap();
    }

    #[test]
    fn test_bad_column_values_skip_only_their_row() {
        let cases = [
            ("CAST(x'ff' AS TEXT)", "0", "1.0", "NULL", "title is not valid UTF-8"),
            ("x'00'", "0", "1.0", "NULL", "title is not text"),
            ("'ok'", "'yes'", "1.0", "NULL", "isCompleted is not an integer"),
            ("'ok'", "0", "'yesterday'", "NULL", "createdAt is not a valid timestamp"),
            ("'ok'", "1", "1.0", "'soon'", "completedAt is not a valid timestamp"),
        ];

        for (title, completed, created, done, reason) in cases {
            let (db, _temp) = setup();
            let repo = TodoRepository::new(&db);
            repo.insert("Good").unwrap();
            insert_bad_row(&db, title, completed, created, done);

            let snapshot = repo.snapshot().unwrap();
            assert_eq!(snapshot.tasks.len(), 1, "case: {reason}");
            assert_eq!(snapshot.tasks[0].title, "Good");
            assert_eq!(snapshot.skipped.len(), 1, "case: {reason}");
            assert_eq!(snapshot.skipped[0].reason, reason);

            assert_eq!(repo.list_all().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_integer_timestamps_are_read() {
        let (db, _temp) = setup();
        insert_bad_row(&db, "'whole seconds'", "1", "100", "200");

        let tasks = TodoRepository::new(&db).list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].created_at.timestamp(), 100);
        assert_eq!(tasks[0].completed_at.map(|t| t.timestamp()), Some(200));
    }

    #[test]
    fn test_corrupt_rows_are_skipped_and_counted() {
        let (db, _temp) = setup();
        let repo = TodoRepository::new(&db);
        repo.insert("Good").unwrap();
        raw_insert(&db, "garbage-id", 0, 1.0, None);
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO todos (id, title, isCompleted, createdAt) VALUES (42, 'int id', 0, 1.0)",
                [],
            )
            .unwrap();

        let snapshot = repo.snapshot().unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].title, "Good");
        assert_eq!(snapshot.skipped.len(), 2);
        assert!(snapshot.skipped.iter().any(|s| s.raw_id == "garbage-id"));

        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Todo.sqlite");

        let (id, created_at) = {
            let db = Database::open(&path).unwrap();
            let repo = TodoRepository::new(&db);
            let task = repo.insert("Survive restart").unwrap();
            repo.toggle_completed(task.id, true).unwrap();
            let created_at = task.created_at;
            db.close().unwrap();
            (task.id, created_at)
        };

        let db = Database::open(&path).unwrap();
        let task = TodoRepository::new(&db).find(id).unwrap().unwrap();
        assert_eq!(task.title, "Survive restart");
        assert_eq!(task.created_at, created_at);
        assert!(task.is_completed);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_shared_handle_across_threads() {
        let (db, _temp) = setup();

        std::thread::scope(|s| {
            for worker in 0..4 {
                let db = &db;
                s.spawn(move || {
                    let repo = TodoRepository::new(db);
                    for i in 0..10 {
                        repo.insert(&format!("worker {worker} item {i}")).unwrap();
                    }
                });
            }
        });

        assert_eq!(TodoRepository::new(&db).list_all().unwrap().len(), 40);
    }

    #[test]
    fn test_statement_error_is_reported() {
        let (db, _temp) = setup();
        db.lock().unwrap().execute("DROP TABLE todos", []).unwrap();

        let repo = TodoRepository::new(&db);
        assert!(matches!(
            repo.insert("x"),
            Err(TodoError::Statement { op: "insert", .. })
        ));
        assert!(matches!(
            repo.list_all(),
            Err(TodoError::Statement { op: "list", .. })
        ));
    }
}
