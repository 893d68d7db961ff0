//! Session controller: the transactional state machine over sessions.
//!
//! A session moves none → active → ended. Every write operation captures
//! the clock once, opens an immediate transaction, performs its
//! read-check-write against the store, and commits; the store's write
//! lock is the serialization point for the one-active-session and
//! one-open-segment invariants, so two concurrent starts cannot both
//! observe "no active session". Any error aborts the transaction with
//! no partial writes.

use std::collections::HashSet;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};
use rusqlite::{TransactionBehavior, params};
use serde::Serialize;
use uuid::Uuid;

use stint_core::{
    Mode, Reason, Segment, Session, SessionId, SessionStatus, SessionView, TodoId, UserId,
    closed_focus_seconds, current_streak, segment_seconds, whole_minutes,
};

use crate::ledger::{self, SegmentFilter};
use crate::{
    Database, DbError, SessionRow, active_session_row, day_start_utc, format_timestamp,
    local_date, parse_timestamp, session_owned_by, todo_owned_by,
};

/// A segment in the cross-session history, with its owning todo and the
/// duration computed at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeEntry {
    #[serde(flatten)]
    pub segment: Segment,
    pub todo_id: TodoId,
    pub duration_seconds: i64,
}

/// Derived per-user statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Consecutive days with at least one focus segment, one-day grace.
    pub current_streak: u32,
    /// Closed focus time across all sessions, truncated to minutes.
    pub total_focus_minutes: i64,
}

impl Database {
    /// Starts a session on a todo.
    ///
    /// Fails with [`DbError::NotFound`] when the todo does not exist or
    /// is not the user's, and [`DbError::Conflict`] when the user
    /// already has an active session. The session insert and the
    /// implicit first focus segment commit as one transaction, so an
    /// active session is never observable with zero segments.
    pub fn start_session(
        &mut self,
        user: &UserId,
        todo_id: &TodoId,
    ) -> Result<SessionView, DbError> {
        self.start_session_at(user, todo_id, Utc::now())
    }

    /// [`Self::start_session`] with an explicit clock reading.
    pub fn start_session_at(
        &mut self,
        user: &UserId,
        todo_id: &TodoId,
        now: DateTime<Utc>,
    ) -> Result<SessionView, DbError> {
        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !todo_owned_by(&tx, todo_id, user)? {
            return Err(DbError::NotFound { what: "todo" });
        }
        if let Some(existing) = active_session_row(&tx, user)? {
            return Err(DbError::Conflict {
                user_id: user.to_string(),
                session_id: existing.id.to_string(),
            });
        }

        let id = SessionId::new(Uuid::new_v4().to_string())?;
        tx.execute(
            "
            INSERT INTO sessions (id, user_id, todo_id, created_at, ended_at, status)
            VALUES (?, ?, ?, ?, NULL, 'active')
            ",
            params![
                id.as_str(),
                user.as_str(),
                todo_id.as_str(),
                format_timestamp(now),
            ],
        )?;
        let segment = ledger::open_first(&tx, &id, now)?;
        tx.commit()?;
        tracing::info!(user = %user, session = %id, todo = %todo_id, "session started");

        Ok(SessionView {
            session: Session {
                id,
                user_id: user.clone(),
                todo_id: todo_id.clone(),
                created_at: now,
                ended_at: None,
                status: SessionStatus::Active,
            },
            segments: vec![segment],
        })
    }

    /// Switches the active session to a new mode.
    ///
    /// Closes the open segment and opens the next one at the same
    /// captured instant, keeping the timeline contiguous. `reason`
    /// defaults to [`Reason::Manual`]. Fails with [`DbError::NotFound`]
    /// when no matching active session is owned by the user, and
    /// [`DbError::InvalidState`] when the session has no open segment
    /// to close.
    pub fn transition_session(
        &mut self,
        user: &UserId,
        session_id: &SessionId,
        mode: Mode,
        reason: Option<Reason>,
    ) -> Result<Segment, DbError> {
        self.transition_session_at(user, session_id, mode, reason, Utc::now())
    }

    /// [`Self::transition_session`] with an explicit clock reading.
    pub fn transition_session_at(
        &mut self,
        user: &UserId,
        session_id: &SessionId,
        mode: Mode,
        reason: Option<Reason>,
        now: DateTime<Utc>,
    ) -> Result<Segment, DbError> {
        let reason = reason.unwrap_or(Reason::Manual);
        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let session = session_owned_by(&tx, session_id, user)?;
        match session {
            Some(session) if session.is_active() => {}
            _ => return Err(DbError::NotFound { what: "active session" }),
        }

        let segment = ledger::close_open_and_open_next(&tx, session_id, mode, reason, now)?;
        tx.commit()?;
        tracing::info!(user = %user, session = %session_id, %mode, %reason, "session transitioned");
        Ok(segment)
    }

    /// Stops the active session.
    ///
    /// Closes the open segment and ends the session at the same captured
    /// instant. A second stop finds no active session and fails with
    /// [`DbError::NotFound`].
    pub fn stop_session(
        &mut self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Session, DbError> {
        self.stop_session_at(user, session_id, Utc::now())
    }

    /// [`Self::stop_session`] with an explicit clock reading.
    pub fn stop_session_at(
        &mut self,
        user: &UserId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Session, DbError> {
        let tx = self
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut session = match session_owned_by(&tx, session_id, user)? {
            Some(session) if session.is_active() => session,
            _ => return Err(DbError::NotFound { what: "active session" }),
        };

        ledger::close_open(&tx, session_id, now)?;
        tx.execute(
            "UPDATE sessions SET status = 'ended', ended_at = ? WHERE id = ?",
            params![format_timestamp(now), session_id.as_str()],
        )?;
        tx.commit()?;
        tracing::info!(user = %user, session = %session_id, "session stopped");

        session.status = SessionStatus::Ended;
        session.ended_at = Some(now);
        Ok(session)
    }

    /// Returns the user's active session with its full segment timeline.
    ///
    /// `None` when no session is active; that is an ordinary result, not
    /// an error.
    pub fn active_session(&self, user: &UserId) -> Result<Option<SessionView>, DbError> {
        let conn = self.connection();
        let Some(session) = active_session_row(conn, user)? else {
            return Ok(None);
        };
        let segments = ledger::segments_of_session(conn, &session.id)?;
        Ok(Some(SessionView { session, segments }))
    }

    /// Sessions created on the given reporting-zone date, oldest first,
    /// each with its ordered segments.
    pub fn daily_history(
        &self,
        user: &UserId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Vec<SessionView>, DbError> {
        let Some(next_day) = date.checked_add_days(Days::new(1)) else {
            return Ok(Vec::new());
        };
        let start = format_timestamp(day_start_utc(date, offset));
        let end = format_timestamp(day_start_utc(next_day, offset));

        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {} FROM sessions
            WHERE user_id = ? AND created_at >= ? AND created_at < ?
            ORDER BY created_at ASC, rowid ASC
            ",
            SessionRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user.as_str(), start, end], SessionRow::from_sql_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }

        let mut views = Vec::with_capacity(sessions.len());
        for session in sessions {
            let segments = ledger::segments_of_session(conn, &session.id)?;
            views.push(SessionView { session, segments });
        }
        Ok(views)
    }

    /// Segments across all the user's sessions, newest first, with the
    /// given filters applied.
    pub fn range_history(
        &self,
        user: &UserId,
        filter: &SegmentFilter,
        offset: FixedOffset,
    ) -> Result<Vec<RangeEntry>, DbError> {
        self.range_history_at(user, filter, offset, Utc::now())
    }

    /// [`Self::range_history`] with an explicit clock reading for live
    /// durations of open segments.
    pub fn range_history_at(
        &self,
        user: &UserId,
        filter: &SegmentFilter,
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> Result<Vec<RangeEntry>, DbError> {
        let rows = ledger::segments_for_user(self.connection(), user, filter, offset)?;
        Ok(rows
            .into_iter()
            .map(|(segment, todo_id)| RangeEntry {
                duration_seconds: segment_seconds(&segment, now),
                segment,
                todo_id,
            })
            .collect())
    }

    /// Streak and lifetime focus totals for a user.
    pub fn user_stats(&self, user: &UserId, offset: FixedOffset) -> Result<UserStats, DbError> {
        self.user_stats_at(user, offset, Utc::now())
    }

    /// [`Self::user_stats`] with an explicit clock reading.
    ///
    /// Streak dates come from focus segment starts, open or closed; the
    /// minute total sums closed focus segments only.
    pub fn user_stats_at(
        &self,
        user: &UserId,
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> Result<UserStats, DbError> {
        let mut stmt = self.connection().prepare(
            "
            SELECT segments.start_at, segments.end_at
            FROM segments
            JOIN sessions ON sessions.id = segments.session_id
            WHERE sessions.user_id = ? AND segments.mode = 'focus'
            ",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut active_dates = HashSet::new();
        let mut total_focus_seconds = 0_i64;
        for row in rows {
            let (start_raw, end_raw) = row?;
            let start = parse_timestamp("segments.start_at", &start_raw)?;
            active_dates.insert(local_date(start, offset));
            if let Some(end_raw) = end_raw {
                let end = parse_timestamp("segments.end_at", &end_raw)?;
                total_focus_seconds += (end - start).num_seconds().max(0);
            }
        }

        Ok(UserStats {
            current_streak: current_streak(&active_dates, local_date(now, offset)),
            total_focus_minutes: whole_minutes(total_focus_seconds),
        })
    }

    /// Lifetime closed-focus seconds for one todo.
    ///
    /// The currently open focus segment is excluded so a client-side
    /// live timer can be layered on top without double counting.
    pub fn todo_focus_seconds(&self, user: &UserId, todo_id: &TodoId) -> Result<i64, DbError> {
        if !todo_owned_by(self.connection(), todo_id, user)? {
            return Err(DbError::NotFound { what: "todo" });
        }
        let filter = SegmentFilter {
            mode: Some(Mode::Focus),
            todo_id: Some(todo_id.clone()),
            ..SegmentFilter::default()
        };
        // No date filters, so the reporting offset cannot matter here.
        let rows = ledger::segments_for_user(self.connection(), user, &filter, Utc.fix())?;
        let segments: Vec<Segment> = rows.into_iter().map(|(segment, _)| segment).collect();
        Ok(closed_focus_seconds(&segments))
    }
}
