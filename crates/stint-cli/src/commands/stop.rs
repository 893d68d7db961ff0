//! Stop command: end the active session.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::Utc;

use stint_core::{UserId, session_totals};
use stint_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, user: &UserId) -> Result<()> {
    let Some(active) = db.active_session(user)? else {
        bail!("no active session");
    };
    let session = db.stop_session(user, &active.session.id)?;

    // The formerly open segment was closed at the session's end instant,
    // so totals over the pre-stop timeline evaluated there are final.
    let ended_at = session.ended_at.unwrap_or_else(Utc::now);
    let totals = session_totals(&active.segments, ended_at);
    writeln!(
        writer,
        "Stopped session {} (focus {}, pause/break {})",
        session.id,
        super::fmt_seconds(totals.focus_seconds),
        super::fmt_seconds(totals.pause_seconds),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stint_core::Priority;

    #[test]
    fn stop_ends_the_active_session() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let todo = db.add_todo(&user, "deep work", Priority::Med).unwrap();
        db.start_session(&user, &todo.id).unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut db, &user).unwrap();
        assert!(String::from_utf8(output).unwrap().starts_with("Stopped session "));
        assert!(db.active_session(&user).unwrap().is_none());
    }

    #[test]
    fn stop_without_active_session_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let mut output = Vec::new();
        let err = run(&mut output, &mut db, &user).unwrap_err();
        assert_eq!(err.to_string(), "no active session");
    }
}
