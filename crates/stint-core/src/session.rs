//! Session and segment domain model.
//!
//! A [`Session`] is one continuous span of work on a todo. Its time is
//! partitioned into ordered, contiguous [`Segment`]s, each in a single
//! [`Mode`]. At most one segment per session is open (no end instant);
//! consecutive segments share a boundary instant exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Mode, Reason, SegmentId, SessionId, SessionStatus, TodoId, UserId};

/// One continuous work span on a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub todo_id: TodoId,
    pub created_at: DateTime<Utc>,
    /// Set when the session is stopped; absent while active.
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl Session {
    /// Whether the session is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// One contiguous interval of a single activity mode within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub session_id: SessionId,
    pub mode: Mode,
    pub start_at: DateTime<Utc>,
    /// Absent while the segment is open.
    pub end_at: Option<DateTime<Utc>>,
    /// Why this segment began. Absent on a session's first segment.
    pub reason: Option<Reason>,
    pub created_at: DateTime<Utc>,
}

impl Segment {
    /// Whether the segment has no end instant yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end_at.is_none()
    }
}

/// A session together with its ordered segment timeline.
///
/// Read model returned by the active-session and history queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    /// Segments ordered by start instant ascending.
    pub segments: Vec<Segment>,
}

/// Structural violations of the segment timeline invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// More than one segment has no end instant.
    #[error("segments {first} and {second} are both open")]
    MultipleOpen { first: SegmentId, second: SegmentId },

    /// A non-final segment has no end instant.
    #[error("segment {id} is open but not the final segment")]
    OpenNotLast { id: SegmentId },

    /// A segment ends before it starts.
    #[error("segment {id} ends at {end} before its start {start}")]
    NegativeSpan {
        id: SegmentId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Consecutive segments do not share a boundary instant.
    #[error("segment {prev} ends at {end} but segment {next} starts at {start}")]
    Discontinuity {
        prev: SegmentId,
        next: SegmentId,
        end: DateTime<Utc>,
        start: DateTime<Utc>,
    },

    /// The session's first segment is not a focus segment.
    #[error("first segment {id} has mode {mode}, expected focus")]
    FirstNotFocus { id: SegmentId, mode: Mode },
}

/// Returns the open segment of a timeline, if any.
///
/// Assumes the timeline is ordered by start instant; the open segment,
/// when present, is the last one.
#[must_use]
pub fn open_segment(segments: &[Segment]) -> Option<&Segment> {
    segments.iter().find(|segment| segment.is_open())
}

/// Verifies the structural invariants of an ordered segment timeline.
///
/// Checks, in order: every closed segment spans forward in time, only
/// the final segment may be open, at most one segment is open,
/// consecutive segments are contiguous (shared boundary instant, no
/// gaps or overlaps), and the first segment is focus.
pub fn verify_timeline(segments: &[Segment]) -> Result<(), TimelineError> {
    if let Some(first) = segments.first() {
        if first.mode != Mode::Focus {
            return Err(TimelineError::FirstNotFocus {
                id: first.id.clone(),
                mode: first.mode,
            });
        }
    }

    let mut open: Option<&Segment> = None;
    for segment in segments {
        if let Some(prior) = open {
            // A prior open segment means either two opens or an open
            // segment followed by anything, both invalid.
            return if segment.is_open() {
                Err(TimelineError::MultipleOpen {
                    first: prior.id.clone(),
                    second: segment.id.clone(),
                })
            } else {
                Err(TimelineError::OpenNotLast {
                    id: prior.id.clone(),
                })
            };
        }
        match segment.end_at {
            Some(end) if end < segment.start_at => {
                return Err(TimelineError::NegativeSpan {
                    id: segment.id.clone(),
                    start: segment.start_at,
                    end,
                });
            }
            Some(_) => {}
            None => open = Some(segment),
        }
    }

    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let Some(end) = prev.end_at else {
            // Already rejected above.
            continue;
        };
        if end != next.start_at {
            return Err(TimelineError::Discontinuity {
                prev: prev.id.clone(),
                next: next.id.clone(),
                end,
                start: next.start_at,
            });
        }
    }

    Ok(())
}
