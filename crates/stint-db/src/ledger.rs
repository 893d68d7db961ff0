//! Segment ledger: the data-integrity layer beneath the session controller.
//!
//! Write helpers run inside the controller's transaction and keep the
//! structural invariants intact: at most one open segment per session,
//! and consecutive segments sharing an exact boundary instant. The close
//! and open of a transition are two statements in one transaction, so no
//! reader ever observes a session with zero open segments.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use uuid::Uuid;

use stint_core::{Mode, Reason, Segment, SegmentId, SessionId, TodoId, UserId};

use crate::{DbError, SegmentRow, day_start_utc, format_timestamp};

/// Optional filters for the segment read path.
#[derive(Debug, Default, Clone)]
pub struct SegmentFilter {
    /// Only segments with this mode.
    pub mode: Option<Mode>,
    /// Only segments recorded with this transition reason.
    pub reason: Option<Reason>,
    /// Only segments starting on or after this reporting-zone date.
    pub start_date: Option<NaiveDate>,
    /// Only segments starting on or before this reporting-zone date.
    pub end_date: Option<NaiveDate>,
    /// Only segments of sessions on this todo.
    pub todo_id: Option<TodoId>,
}

/// Inserts a segment row and returns it as a domain segment.
fn insert_segment(
    conn: &Connection,
    session_id: &SessionId,
    mode: Mode,
    reason: Option<Reason>,
    now: DateTime<Utc>,
) -> Result<Segment, DbError> {
    let id = Uuid::new_v4().to_string();
    let timestamp = format_timestamp(now);
    conn.execute(
        "
        INSERT INTO segments (id, session_id, mode, start_at, end_at, reason, created_at)
        VALUES (?, ?, ?, ?, NULL, ?, ?)
        ",
        params![
            id,
            session_id.as_str(),
            mode.as_str(),
            timestamp,
            reason.map(|reason| reason.as_str()),
            timestamp,
        ],
    )?;
    tracing::debug!(session = %session_id, %mode, ?reason, "opened segment");
    Ok(Segment {
        id: SegmentId::new(id)?,
        session_id: session_id.clone(),
        mode,
        start_at: now,
        end_at: None,
        reason,
        created_at: now,
    })
}

/// Opens a session's implicit first segment.
///
/// Always focus mode with no reason; runs in the same transaction as the
/// session insert so an active session is never visible without it.
pub(crate) fn open_first(
    conn: &Connection,
    session_id: &SessionId,
    now: DateTime<Utc>,
) -> Result<Segment, DbError> {
    insert_segment(conn, session_id, Mode::Focus, None, now)
}

/// Closes the session's open segment at `now`.
///
/// Errors with [`DbError::InvalidState`] when no open segment exists;
/// callers that reach that state have a structurally broken session and
/// must not paper over it.
pub(crate) fn close_open(
    conn: &Connection,
    session_id: &SessionId,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let closed = conn.execute(
        "UPDATE segments SET end_at = ? WHERE session_id = ? AND end_at IS NULL",
        params![format_timestamp(now), session_id.as_str()],
    )?;
    if closed == 0 {
        return Err(DbError::InvalidState {
            message: format!("no open segment to close in session {session_id}"),
        });
    }
    Ok(())
}

/// Closes the open segment and opens the next one at the same instant.
///
/// Both writes use the single `now` captured by the caller, so the old
/// segment's end equals the new segment's start exactly.
pub(crate) fn close_open_and_open_next(
    conn: &Connection,
    session_id: &SessionId,
    mode: Mode,
    reason: Reason,
    now: DateTime<Utc>,
) -> Result<Segment, DbError> {
    close_open(conn, session_id, now)?;
    insert_segment(conn, session_id, mode, Some(reason), now)
}

/// Returns the session's open segment, if any.
pub(crate) fn open_segment(
    conn: &Connection,
    session_id: &SessionId,
) -> Result<Option<Segment>, DbError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM segments WHERE session_id = ? AND end_at IS NULL",
                SegmentRow::COLUMNS
            ),
            params![session_id.as_str()],
            SegmentRow::from_sql_row,
        )
        .optional()?;
    row.map(SegmentRow::into_segment).transpose()
}

/// Lists a session's segments ordered by start instant.
///
/// Rowid breaks ties between zero-length segments created at the same
/// instant, preserving insertion order.
pub(crate) fn segments_of_session(
    conn: &Connection,
    session_id: &SessionId,
) -> Result<Vec<Segment>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "
        SELECT {} FROM segments
        WHERE session_id = ?
        ORDER BY start_at ASC, rowid ASC
        ",
        SegmentRow::COLUMNS
    ))?;
    let rows = stmt.query_map(params![session_id.as_str()], SegmentRow::from_sql_row)?;
    let mut segments = Vec::new();
    for row in rows {
        segments.push(row?.into_segment()?);
    }
    Ok(segments)
}

/// Lists a user's segments across sessions, newest first.
///
/// Date filters bucket by the segment's start instant in the reporting
/// zone given by `offset`.
pub(crate) fn segments_for_user(
    conn: &Connection,
    user: &UserId,
    filter: &SegmentFilter,
    offset: FixedOffset,
) -> Result<Vec<(Segment, TodoId)>, DbError> {
    let mut sql = format!(
        "
        SELECT {}, sessions.todo_id
        FROM segments
        JOIN sessions ON sessions.id = segments.session_id
        WHERE sessions.user_id = ?
        ",
        SegmentRow::COLUMNS
            .split(", ")
            .map(|column| format!("segments.{column}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut params: Vec<String> = vec![user.as_str().to_string()];

    if let Some(mode) = filter.mode {
        sql.push_str(" AND segments.mode = ?");
        params.push(mode.as_str().to_string());
    }
    if let Some(reason) = filter.reason {
        sql.push_str(" AND segments.reason = ?");
        params.push(reason.as_str().to_string());
    }
    if let Some(start_date) = filter.start_date {
        sql.push_str(" AND segments.start_at >= ?");
        params.push(format_timestamp(day_start_utc(start_date, offset)));
    }
    if let Some(end_date) = filter.end_date {
        // Inclusive date bound: everything before the following local midnight.
        if let Some(next_day) = end_date.checked_add_days(Days::new(1)) {
            sql.push_str(" AND segments.start_at < ?");
            params.push(format_timestamp(day_start_utc(next_day, offset)));
        }
    }
    if let Some(todo_id) = &filter.todo_id {
        sql.push_str(" AND sessions.todo_id = ?");
        params.push(todo_id.as_str().to_string());
    }

    sql.push_str(" ORDER BY segments.start_at DESC, segments.rowid DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), |row| {
        let segment = SegmentRow::from_sql_row(row)?;
        let todo_id: String = row.get(7)?;
        Ok((segment, todo_id))
    })?;
    let mut segments = Vec::new();
    for row in rows {
        let (segment, todo_id) = row?;
        segments.push((segment.into_segment()?, TodoId::new(todo_id)?));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn seed_session(db: &Database, session: &str) -> SessionId {
        let conn = db.connection();
        conn.execute(
            "INSERT OR IGNORE INTO todos (id, user_id, title, priority, created_at)
             VALUES ('todo-1', 'user-1', 'write tests', 'med', '2023-11-14T00:00:00.000Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO sessions (id, user_id, todo_id, created_at, status)
             VALUES (?, 'user-1', 'todo-1', '2023-11-14T00:00:00.000Z', 'active')",
            params![session],
        )
        .unwrap();
        SessionId::new(session).unwrap()
    }

    #[test]
    fn open_first_creates_open_focus_segment_without_reason() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");

        let segment = open_first(db.connection(), &session, ts(0)).unwrap();
        assert_eq!(segment.mode, Mode::Focus);
        assert!(segment.is_open());
        assert!(segment.reason.is_none());

        let stored = open_segment(db.connection(), &session).unwrap().unwrap();
        assert_eq!(stored, segment);
    }

    #[test]
    fn close_open_without_open_segment_is_invalid_state() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");

        let err = close_open(db.connection(), &session, ts(0)).unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
    }

    #[test]
    fn transition_keeps_timeline_contiguous() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");
        open_first(db.connection(), &session, ts(0)).unwrap();

        close_open_and_open_next(db.connection(), &session, Mode::Pause, Reason::Idle, ts(60))
            .unwrap();
        close_open_and_open_next(db.connection(), &session, Mode::Focus, Reason::Manual, ts(90))
            .unwrap();

        let segments = segments_of_session(db.connection(), &session).unwrap();
        assert_eq!(segments.len(), 3);
        stint_core::verify_timeline(&segments).unwrap();
        assert_eq!(segments[0].end_at, Some(segments[1].start_at));
        assert_eq!(segments[1].end_at, Some(segments[2].start_at));
        assert!(segments[2].is_open());
    }

    #[test]
    fn one_open_segment_index_rejects_second_open_insert() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");
        open_first(db.connection(), &session, ts(0)).unwrap();

        // Bypassing close_open must trip the partial unique index.
        let result = insert_segment(db.connection(), &session, Mode::Pause, Some(Reason::Idle), ts(5));
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn filter_by_mode_returns_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");
        open_first(db.connection(), &session, ts(0)).unwrap();
        close_open_and_open_next(db.connection(), &session, Mode::Pause, Reason::Idle, ts(60))
            .unwrap();
        close_open_and_open_next(db.connection(), &session, Mode::Focus, Reason::Manual, ts(90))
            .unwrap();
        close_open_and_open_next(db.connection(), &session, Mode::Pause, Reason::Hidden, ts(120))
            .unwrap();

        let user = UserId::new("user-1").unwrap();
        let filter = SegmentFilter {
            mode: Some(Mode::Pause),
            ..SegmentFilter::default()
        };
        let utc = FixedOffset::east_opt(0).unwrap();
        let pauses = segments_for_user(db.connection(), &user, &filter, utc).unwrap();

        assert_eq!(pauses.len(), 2);
        assert!(pauses.iter().all(|(segment, _)| segment.mode == Mode::Pause));
        assert_eq!(pauses[0].0.start_at, ts(120));
        assert_eq!(pauses[1].0.start_at, ts(60));
    }

    #[test]
    fn date_filters_bucket_by_reporting_offset() {
        let db = Database::open_in_memory().unwrap();
        let session = seed_session(&db, "sess-1");
        // 23:30 UTC on 2023-11-14 (ts base is 2023-11-14T22:13:20Z).
        open_first(db.connection(), &session, ts(4600)).unwrap();

        let user = UserId::new("user-1").unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 11, 15).unwrap();
        let filter = SegmentFilter {
            start_date: Some(date),
            end_date: Some(date),
            ..SegmentFilter::default()
        };

        // In UTC the segment belongs to the 14th.
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(segments_for_user(db.connection(), &user, &filter, utc)
            .unwrap()
            .is_empty());

        // At UTC+2 the same instant is already the 15th.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            segments_for_user(db.connection(), &user, &filter, plus_two)
                .unwrap()
                .len(),
            1
        );
    }
}
