//! Stats command: streak and lifetime focus totals.

use std::io::Write;

use anyhow::Result;
use chrono::FixedOffset;

use stint_core::UserId;
use stint_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &UserId,
    offset: FixedOffset,
) -> Result<()> {
    let stats = db.user_stats(user, offset)?;
    writeln!(writer, "Current streak: {} day(s)", stats.current_streak)?;
    writeln!(writer, "Total focus: {} minute(s)", stats.total_focus_minutes)?;
    Ok(())
}
