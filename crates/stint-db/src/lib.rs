//! Storage layer and session state machine for stint.
//!
//! Provides persistence for todos, sessions and segments using `rusqlite`,
//! and the transactional operations that enforce the session invariants:
//! at most one active session per user, at most one open segment per
//! session, and a contiguous non-overlapping segment timeline.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send`
//! but not `Sync`. For multi-threaded access use a `Mutex<Database>`, a
//! connection pool, or one `Database` per thread; the invariants are
//! enforced by SQLite transactions either way, so concurrent writers
//! through separate connections still serialize on the write lock.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 UTC format (e.g.
//! `2024-01-15T10:30:00.000Z`) so lexicographic ordering matches
//! chronological ordering. Segment mode, reason and session status are
//! stored as their lowercase string forms and validated on read.
//!
//! Two partial unique indexes back the structural invariants at the
//! storage level: one active session per user, one open segment per
//! session. The transactional read-check-write paths report the
//! friendly [`DbError::Conflict`] / [`DbError::InvalidState`] errors
//! before those indexes would fire.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use stint_core::{
    Segment, SegmentId, Session, SessionId, SessionStatus, TodoId, UserId, ValidationError,
};

pub mod ledger;
mod sessions;
mod todos;

pub use ledger::SegmentFilter;
pub use sessions::{RangeEntry, UserStats};
pub use todos::Todo;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A referenced record does not exist or is not owned by the caller.
    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// The user already has an active session.
    #[error("user {user_id} already has active session {session_id}")]
    Conflict { user_id: String, session_id: String },

    /// A structural invariant would be violated, e.g. closing a segment
    /// when no open segment exists.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in {column}: {value}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored or supplied value failed core validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety and schema notes.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'med',
                created_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);

            -- Sessions: one continuous work span on a todo.
            -- status: 'active' or 'ended'; ended_at is set when status flips.
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                todo_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                ended_at TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                FOREIGN KEY (todo_id) REFERENCES todos(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_status ON sessions(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions(created_at);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
                ON sessions(user_id) WHERE status = 'active';

            -- Segments: ordered, contiguous activity intervals of a session.
            -- end_at IS NULL marks the single open segment; reason is NULL
            -- only on a session's first segment.
            CREATE TABLE IF NOT EXISTS segments (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                mode TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT,
                reason TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_segments_session ON segments(session_id);
            CREATE INDEX IF NOT EXISTS idx_segments_start ON segments(start_at);
            CREATE INDEX IF NOT EXISTS idx_segments_mode ON segments(mode);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_segments_one_open
                ON segments(session_id) WHERE end_at IS NULL;
            ",
        )?;
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Formats an instant for storage.
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp, attributing failures to a column.
pub(crate) fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            column,
            value: value.to_string(),
            source,
        })
}

/// UTC instant at which the given reporting-zone date begins.
pub(crate) fn day_start_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) - offset))
}

/// Calendar date of an instant in the reporting zone.
pub(crate) fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Raw session row as stored.
pub(crate) struct SessionRow {
    id: String,
    user_id: String,
    todo_id: String,
    created_at: String,
    ended_at: Option<String>,
    status: String,
}

impl SessionRow {
    pub(crate) const COLUMNS: &'static str = "id, user_id, todo_id, created_at, ended_at, status";

    pub(crate) fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            todo_id: row.get(2)?,
            created_at: row.get(3)?,
            ended_at: row.get(4)?,
            status: row.get(5)?,
        })
    }

    pub(crate) fn into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: SessionId::new(self.id)?,
            user_id: UserId::new(self.user_id)?,
            todo_id: TodoId::new(self.todo_id)?,
            created_at: parse_timestamp("sessions.created_at", &self.created_at)?,
            ended_at: self
                .ended_at
                .as_deref()
                .map(|value| parse_timestamp("sessions.ended_at", value))
                .transpose()?,
            status: self.status.parse::<SessionStatus>()?,
        })
    }
}

/// Raw segment row as stored.
pub(crate) struct SegmentRow {
    id: String,
    session_id: String,
    mode: String,
    start_at: String,
    end_at: Option<String>,
    reason: Option<String>,
    created_at: String,
}

impl SegmentRow {
    pub(crate) const COLUMNS: &'static str = "id, session_id, mode, start_at, end_at, reason, created_at";

    pub(crate) fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            mode: row.get(2)?,
            start_at: row.get(3)?,
            end_at: row.get(4)?,
            reason: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub(crate) fn into_segment(self) -> Result<Segment, DbError> {
        Ok(Segment {
            id: SegmentId::new(self.id)?,
            session_id: SessionId::new(self.session_id)?,
            mode: self.mode.parse()?,
            start_at: parse_timestamp("segments.start_at", &self.start_at)?,
            end_at: self
                .end_at
                .as_deref()
                .map(|value| parse_timestamp("segments.end_at", value))
                .transpose()?,
            reason: self.reason.as_deref().map(str::parse).transpose()?,
            created_at: parse_timestamp("segments.created_at", &self.created_at)?,
        })
    }
}

/// Looks up a session by ID scoped to its owner.
pub(crate) fn session_owned_by(
    conn: &Connection,
    session_id: &SessionId,
    user: &UserId,
) -> Result<Option<Session>, DbError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM sessions WHERE id = ? AND user_id = ?",
                SessionRow::COLUMNS
            ),
            params![session_id.as_str(), user.as_str()],
            SessionRow::from_sql_row,
        )
        .optional()?;
    row.map(SessionRow::into_session).transpose()
}

/// Looks up the user's active session, if any.
pub(crate) fn active_session_row(conn: &Connection, user: &UserId) -> Result<Option<Session>, DbError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM sessions WHERE user_id = ? AND status = 'active'",
                SessionRow::COLUMNS
            ),
            params![user.as_str()],
            SessionRow::from_sql_row,
        )
        .optional()?;
    row.map(SessionRow::into_session).transpose()
}

/// Checks that a todo exists and belongs to the user.
pub(crate) fn todo_owned_by(conn: &Connection, todo_id: &TodoId, user: &UserId) -> Result<bool, DbError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT id FROM todos WHERE id = ? AND user_id = ?",
            params![todo_id.as_str(), user.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
