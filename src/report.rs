//! Output-only text rendering of totals. Nothing here is ever parsed back.

use crate::constants::{SECS_PER_DAY, SECS_PER_HOUR, SECS_PER_MINUTE};
use crate::models::ApplicationRecord;
use std::fmt::Write;
use std::time::Duration;

/// Formats seconds as `"Xd Yh Zm Ws"`, truncating any fraction.
pub fn format_duration(seconds: f64) -> String {
    let total = Duration::try_from_secs_f64(seconds.max(0.0))
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let days = total / SECS_PER_DAY;
    let hours = total % SECS_PER_DAY / SECS_PER_HOUR;
    let minutes = total % SECS_PER_HOUR / SECS_PER_MINUTE;
    let secs = total % SECS_PER_MINUTE;
    format!("{days}d {hours}h {minutes}m {secs}s")
}

/// One line per record, `label: duration`, in the order given.
pub fn summary(rows: &[&ApplicationRecord]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "{}: {}", row.label, format_duration(row.accumulated_seconds));
    }
    out
}
