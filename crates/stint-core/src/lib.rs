//! Core domain logic for the stint focus-session tracker.
//!
//! This crate contains the fundamental types and pure derivations:
//! - Session/segment model and timeline invariant checks
//! - Duration aggregation treating open segments as live
//! - Consecutive-day focus streak computation

pub mod duration;
pub mod session;
pub mod streak;
mod types;

pub use duration::{SessionTotals, closed_focus_seconds, segment_seconds, session_totals, whole_minutes};
pub use session::{Segment, Session, SessionView, TimelineError, open_segment, verify_timeline};
pub use streak::current_streak;
pub use types::{
    Mode, Priority, Reason, SegmentId, SessionId, SessionStatus, TodoId, UserId, ValidationError,
};
