//! CLI subcommand implementations.

pub mod history;
pub mod init;
pub mod start;
pub mod stats;
pub mod status;
pub mod stop;
pub mod todo;
pub mod transition;

/// Formats whole seconds as `1h 23m 45s`, omitting leading zero units.
pub(crate) fn fmt_seconds(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
