//! Narrow todo store.
//!
//! Todos are the external task collaborator the session core checks
//! existence and ownership against. Only the fields the tracker needs
//! live here; anything richer belongs to a dedicated task service.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use uuid::Uuid;

use stint_core::{Priority, TodoId, UserId, ValidationError};

use crate::{Database, DbError, format_timestamp, parse_timestamp};

/// A task a session can be opened against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: TodoId,
    pub user_id: UserId,
    pub title: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Raw todo row as stored.
struct TodoRow {
    id: String,
    user_id: String,
    title: String,
    priority: String,
    created_at: String,
    completed_at: Option<String>,
}

impl TodoRow {
    const COLUMNS: &'static str = "id, user_id, title, priority, created_at, completed_at";

    fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            priority: row.get(3)?,
            created_at: row.get(4)?,
            completed_at: row.get(5)?,
        })
    }

    fn into_todo(self) -> Result<Todo, DbError> {
        Ok(Todo {
            id: TodoId::new(self.id)?,
            user_id: UserId::new(self.user_id)?,
            title: self.title,
            priority: self.priority.parse()?,
            created_at: parse_timestamp("todos.created_at", &self.created_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(|value| parse_timestamp("todos.completed_at", value))
                .transpose()?,
        })
    }
}

impl Database {
    /// Creates a todo for the user.
    pub fn add_todo(
        &mut self,
        user: &UserId,
        title: &str,
        priority: Priority,
    ) -> Result<Todo, DbError> {
        self.add_todo_at(user, title, priority, Utc::now())
    }

    /// Creates a todo with an explicit creation instant.
    pub fn add_todo_at(
        &mut self,
        user: &UserId,
        title: &str,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Todo, DbError> {
        if title.trim().is_empty() {
            return Err(ValidationError::Empty { field: "title" }.into());
        }
        let id = TodoId::new(Uuid::new_v4().to_string())?;
        self.connection().execute(
            "
            INSERT INTO todos (id, user_id, title, priority, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            ",
            params![
                id.as_str(),
                user.as_str(),
                title,
                priority.as_str(),
                format_timestamp(now),
            ],
        )?;
        tracing::debug!(user = %user, todo = %id, "todo created");
        Ok(Todo {
            id,
            user_id: user.clone(),
            title: title.to_string(),
            priority,
            created_at: now,
            completed_at: None,
        })
    }

    /// Lists the user's todos, newest first.
    pub fn list_todos(&self, user: &UserId) -> Result<Vec<Todo>, DbError> {
        let mut stmt = self.connection().prepare(&format!(
            "
            SELECT {} FROM todos
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            ",
            TodoRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user.as_str()], TodoRow::from_sql_row)?;
        let mut todos = Vec::new();
        for row in rows {
            todos.push(row?.into_todo()?);
        }
        Ok(todos)
    }

    /// Fetches one of the user's todos.
    pub fn get_todo(&self, user: &UserId, todo_id: &TodoId) -> Result<Todo, DbError> {
        let row = self
            .connection()
            .query_row(
                &format!(
                    "SELECT {} FROM todos WHERE id = ? AND user_id = ?",
                    TodoRow::COLUMNS
                ),
                params![todo_id.as_str(), user.as_str()],
                TodoRow::from_sql_row,
            )
            .optional()?;
        row.map(TodoRow::into_todo)
            .transpose()?
            .ok_or(DbError::NotFound { what: "todo" })
    }

    /// Marks a todo completed.
    pub fn complete_todo(&mut self, user: &UserId, todo_id: &TodoId) -> Result<Todo, DbError> {
        self.complete_todo_at(user, todo_id, Utc::now())
    }

    /// Marks a todo completed at an explicit instant.
    pub fn complete_todo_at(
        &mut self,
        user: &UserId,
        todo_id: &TodoId,
        now: DateTime<Utc>,
    ) -> Result<Todo, DbError> {
        let updated = self.connection().execute(
            "UPDATE todos SET completed_at = ? WHERE id = ? AND user_id = ?",
            params![format_timestamp(now), todo_id.as_str(), user.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound { what: "todo" });
        }
        self.get_todo(user, todo_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn add_and_get_todo() {
        let mut db = Database::open_in_memory().unwrap();
        let todo = db
            .add_todo_at(&user(), "write the report", Priority::High, ts(0))
            .unwrap();
        let fetched = db.get_todo(&user(), &todo.id).unwrap();
        assert_eq!(fetched, todo);
        assert_eq!(fetched.priority, Priority::High);
        assert!(fetched.completed_at.is_none());
    }

    #[test]
    fn add_todo_rejects_blank_title() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.add_todo(&user(), "   ", Priority::Med).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn list_todos_newest_first_scoped_to_user() {
        let mut db = Database::open_in_memory().unwrap();
        let other = UserId::new("user-2").unwrap();
        db.add_todo_at(&user(), "first", Priority::Med, ts(0)).unwrap();
        db.add_todo_at(&user(), "second", Priority::Med, ts(60)).unwrap();
        db.add_todo_at(&other, "not mine", Priority::Med, ts(30)).unwrap();

        let todos = db.list_todos(&user()).unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "second");
        assert_eq!(todos[1].title, "first");
    }

    #[test]
    fn get_todo_of_other_user_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let other = UserId::new("user-2").unwrap();
        let todo = db.add_todo_at(&other, "theirs", Priority::Med, ts(0)).unwrap();
        let err = db.get_todo(&user(), &todo.id).unwrap_err();
        assert!(matches!(err, DbError::NotFound { what: "todo" }));
    }

    #[test]
    fn complete_todo_sets_completion_instant() {
        let mut db = Database::open_in_memory().unwrap();
        let todo = db.add_todo_at(&user(), "task", Priority::Low, ts(0)).unwrap();
        let done = db.complete_todo_at(&user(), &todo.id, ts(3600)).unwrap();
        assert_eq!(done.completed_at, Some(ts(3600)));
    }

    #[test]
    fn complete_unknown_todo_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let missing = TodoId::new("missing").unwrap();
        let err = db.complete_todo(&user(), &missing).unwrap_err();
        assert!(matches!(err, DbError::NotFound { what: "todo" }));
    }
}
