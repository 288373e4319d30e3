use crate::config::DbPath;
use crate::core::{Filter, TodoList};
use crate::db::Database;
use crate::error::TodoError;
use crate::models::Task;

/// Handle the list command
pub fn handle_list(db: &Database, filter: Filter, json: bool) -> Result<(), TodoError> {
    let list = TodoList::new(db);
    let tasks = list.visible(filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for task in &tasks {
        println!("{}", format_line(task));
    }

    let done = tasks.iter().filter(|t| t.is_completed).count();
    println!();
    println!("{} active, {} completed", tasks.len() - done, done);

    Ok(())
}

/// Handle the add command
pub fn handle_add(db: &Database, title: &str) -> Result<(), TodoError> {
    let task = TodoList::new(db).add(title)?;
    println!("Created task [{}]: {}", task.id.short(), task.title);
    Ok(())
}

/// Handle the edit command
pub fn handle_edit(db: &Database, id: &str, title: &str) -> Result<(), TodoError> {
    let list = TodoList::new(db);
    let id = list.resolve(id)?;
    let task = list.rename(id, title)?;
    println!("Updated task [{}]: {}", task.id.short(), task.title);
    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(db: &Database, id: &str) -> Result<(), TodoError> {
    let list = TodoList::new(db);
    let id = list.resolve(id)?;
    let task = list.toggle(id)?;
    let state = if task.is_completed { "Completed" } else { "Reopened" };
    println!("{state} task [{}]: {}", task.id.short(), task.title);
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(db: &Database, id: &str) -> Result<(), TodoError> {
    let list = TodoList::new(db);
    let id = list.resolve(id)?;
    let task = list.remove(id)?;
    println!("Deleted task [{}]: {}", task.id.short(), task.title);
    Ok(())
}

/// Handle the path command
pub fn handle_path(path: &DbPath) {
    println!("{}", path.as_path().display());
}

fn format_line(task: &Task) -> String {
    let mut line = format!("  [{}] {} {}", task.id.short(), task.icon(), task.title);
    if let Some(done) = task.completed_at {
        line.push_str(&format!(" (done {})", done.format("%Y-%m-%d %H:%M")));
    }
    line
}
