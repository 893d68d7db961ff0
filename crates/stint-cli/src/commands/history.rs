//! History commands: daily session view and filtered segment range.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};

use stint_core::{UserId, session_totals};
use stint_db::{Database, SegmentFilter};

/// Prints the sessions created on one reporting-zone date with their
/// segments and category totals.
pub fn daily<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &UserId,
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<()> {
    daily_at(writer, db, user, date, offset, Utc::now())
}

pub fn daily_at<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &UserId,
    date: NaiveDate,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<()> {
    let views = db.daily_history(user, date, offset)?;
    if views.is_empty() {
        writeln!(writer, "No sessions on {date}.")?;
        return Ok(());
    }

    for view in views {
        let totals = session_totals(&view.segments, now);
        writeln!(
            writer,
            "Session {} [{}] focus {}, pause/break {}",
            view.session.id,
            view.session.status,
            super::fmt_seconds(totals.focus_seconds),
            super::fmt_seconds(totals.pause_seconds),
        )?;
        for segment in &view.segments {
            let end = segment.end_at.map_or_else(
                || "open".to_string(),
                |end| end.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            let reason = segment
                .reason
                .map_or_else(String::new, |reason| format!(" ({reason})"));
            writeln!(
                writer,
                "  {} {} -> {}{}",
                segment.mode,
                segment.start_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                end,
                reason,
            )?;
        }
    }
    Ok(())
}

/// Prints segments across sessions, newest first, with filters applied.
pub fn range<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &UserId,
    filter: &SegmentFilter,
    offset: FixedOffset,
) -> Result<()> {
    let entries = db.range_history(user, filter, offset)?;
    if entries.is_empty() {
        writeln!(writer, "No matching segments.")?;
        return Ok(());
    }
    for entry in entries {
        let reason = entry
            .segment
            .reason
            .map_or_else(String::new, |reason| format!(" ({reason})"));
        writeln!(
            writer,
            "{} {} {}{} todo {}",
            entry
                .segment
                .start_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.segment.mode,
            super::fmt_seconds(entry.duration_seconds),
            reason,
            entry.todo_id,
        )?;
    }
    Ok(())
}
