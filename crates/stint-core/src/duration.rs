//! Derived duration math.
//!
//! All computations are read-only. An open segment's effective end is
//! the `now` passed by the caller, never a stored value; the caller
//! captures the clock once per operation and threads it through.
//!
//! Durations are whole seconds with sub-second fractions truncated;
//! minute totals truncate seconds (integer division by 60).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Segment;
use crate::types::Mode;

/// Elapsed seconds of a segment at `now`.
///
/// A closed segment uses its stored end instant; an open one accrues up
/// to `now`. Clamped at zero so a clock queried before the segment's
/// start never yields a negative span.
#[must_use]
pub fn segment_seconds(segment: &Segment, now: DateTime<Utc>) -> i64 {
    let end = segment.end_at.unwrap_or(now);
    (end - segment.start_at).num_seconds().max(0)
}

/// Per-session elapsed time bucketed by category.
///
/// Pause and break are combined: both are "not focused" for session
/// accounting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTotals {
    /// Seconds spent in focus segments, including a live open one.
    pub focus_seconds: i64,
    /// Seconds spent in pause and break segments, including a live open one.
    pub pause_seconds: i64,
}

/// Sums a session's segment durations at `now`, bucketed by category.
#[must_use]
pub fn session_totals(segments: &[Segment], now: DateTime<Utc>) -> SessionTotals {
    let mut totals = SessionTotals::default();
    for segment in segments {
        let seconds = segment_seconds(segment, now);
        match segment.mode {
            Mode::Focus => totals.focus_seconds += seconds,
            Mode::Pause | Mode::Break => totals.pause_seconds += seconds,
        }
    }
    totals
}

/// Sums closed focus segments only.
///
/// A currently open focus segment is deliberately excluded, unlike
/// [`session_totals`]: lifetime todo totals feed clients that run their
/// own live timer on top, and including the open segment would double
/// count it.
#[must_use]
pub fn closed_focus_seconds(segments: &[Segment]) -> i64 {
    segments
        .iter()
        .filter(|segment| segment.mode == Mode::Focus)
        .filter_map(|segment| {
            let end = segment.end_at?;
            Some((end - segment.start_at).num_seconds().max(0))
        })
        .sum()
}

/// Truncates seconds to whole minutes.
#[must_use]
pub const fn whole_minutes(seconds: i64) -> i64 {
    seconds / 60
}
