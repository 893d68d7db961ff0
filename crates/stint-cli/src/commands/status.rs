//! Status command: the active session and its live durations.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

use stint_core::{UserId, open_segment, segment_seconds, session_totals};
use stint_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, user: &UserId) -> Result<()> {
    run_at(writer, db, user, Utc::now())
}

pub fn run_at<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &UserId,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(view) = db.active_session(user)? else {
        writeln!(writer, "No active session.")?;
        return Ok(());
    };

    let todo = db.get_todo(user, &view.session.todo_id)?;
    writeln!(
        writer,
        "Session {} on \"{}\" since {}",
        view.session.id,
        todo.title,
        view.session
            .created_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    )?;

    if let Some(current) = open_segment(&view.segments) {
        writeln!(
            writer,
            "Mode: {} for {}",
            current.mode,
            super::fmt_seconds(segment_seconds(current, now)),
        )?;
    }

    let totals = session_totals(&view.segments, now);
    writeln!(
        writer,
        "Focus: {}, pause/break: {}",
        super::fmt_seconds(totals.focus_seconds),
        super::fmt_seconds(totals.pause_seconds),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stint_core::{Mode, Priority, Reason};

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn status_without_session() {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &user).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No active session.\n");
    }

    #[test]
    fn status_shows_live_mode_and_totals() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("user-1").unwrap();
        let todo = db.add_todo_at(&user, "deep work", Priority::Med, ts(0)).unwrap();
        let view = db.start_session_at(&user, &todo.id, ts(0)).unwrap();
        db.transition_session_at(&user, &view.session.id, Mode::Pause, Some(Reason::Idle), ts(600))
            .unwrap();

        let mut output = Vec::new();
        run_at(&mut output, &db, &user, ts(660)).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("on \"deep work\""));
        assert!(output.contains("Mode: pause for 1m 0s"));
        assert!(output.contains("Focus: 10m 0s, pause/break: 1m 0s"));
    }
}
