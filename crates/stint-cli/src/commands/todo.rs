//! Todo commands: add, list, done.

use std::io::Write;

use anyhow::Result;

use stint_core::{Priority, TodoId, UserId};
use stint_db::Database;

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &UserId,
    title: &str,
    priority: Priority,
) -> Result<()> {
    let todo = db.add_todo(user, title, priority)?;
    writeln!(writer, "Added todo {} ({})", todo.id, todo.title)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, user: &UserId) -> Result<()> {
    let todos = db.list_todos(user)?;
    if todos.is_empty() {
        writeln!(writer, "No todos.")?;
        return Ok(());
    }
    for todo in todos {
        let focus_seconds = db.todo_focus_seconds(user, &todo.id)?;
        let state = if todo.completed_at.is_some() { "done" } else { "open" };
        writeln!(
            writer,
            "{} [{}] [{}] {} ({})",
            todo.id,
            state,
            todo.priority,
            todo.title,
            super::fmt_seconds(focus_seconds),
        )?;
    }
    Ok(())
}

pub fn done<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &UserId,
    todo_id: &TodoId,
) -> Result<()> {
    let todo = db.complete_todo(user, todo_id)?;
    writeln!(writer, "Completed todo {} ({})", todo.id, todo.title)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn add_then_list_shows_todo_with_zero_focus() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(&mut output, &mut db, &user(), "deep work", Priority::High).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db, &user()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("[open] [high] deep work (0s)"));
    }

    #[test]
    fn list_without_todos_prints_placeholder() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, &user()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No todos.\n");
    }

    #[test]
    fn done_marks_todo_completed() {
        let mut db = Database::open_in_memory().unwrap();
        let todo = db.add_todo(&user(), "task", Priority::Med).unwrap();
        let mut output = Vec::new();
        done(&mut output, &mut db, &user(), &todo.id).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db, &user()).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("[done]"));
    }
}
