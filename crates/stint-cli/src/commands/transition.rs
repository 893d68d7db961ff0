//! Pause, break and resume commands: mode transitions on the active session.

use std::io::Write;

use anyhow::{Result, bail};

use stint_core::{Mode, Reason, UserId};
use stint_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &UserId,
    mode: Mode,
    reason: Reason,
) -> Result<()> {
    let Some(active) = db.active_session(user)? else {
        bail!("no active session");
    };
    let segment = db.transition_session(user, &active.session.id, mode, Some(reason))?;
    writeln!(
        writer,
        "Session {} now in {} ({})",
        active.session.id, segment.mode, reason
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stint_core::Priority;

    #[test]
    fn transition_moves_active_session_to_new_mode() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let todo = db.add_todo(&user, "deep work", Priority::Med).unwrap();
        db.start_session(&user, &todo.id).unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut db, &user, Mode::Pause, Reason::Idle).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("now in pause (idle)"));

        let active = db.active_session(&user).unwrap().unwrap();
        assert_eq!(active.segments.len(), 2);
        assert_eq!(active.segments[1].mode, Mode::Pause);
    }

    #[test]
    fn transition_without_active_session_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let mut output = Vec::new();
        let err = run(&mut output, &mut db, &user, Mode::Pause, Reason::Manual).unwrap_err();
        assert_eq!(err.to_string(), "no active session");
    }
}
