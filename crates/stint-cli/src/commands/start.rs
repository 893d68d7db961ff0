//! Start command: open a session on a todo.

use std::io::Write;

use anyhow::Result;

use stint_core::{TodoId, UserId};
use stint_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &UserId,
    todo_id: &TodoId,
) -> Result<()> {
    let todo = db.get_todo(user, todo_id)?;
    let view = db.start_session(user, todo_id)?;
    writeln!(
        writer,
        "Started session {} on \"{}\", focusing",
        view.session.id, todo.title
    )?;
    Ok(())
}
