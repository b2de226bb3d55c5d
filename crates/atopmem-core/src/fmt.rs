//! Shared formatting helpers for the report emitters.

use chrono::NaiveDateTime;

/// Timestamp layout used in CSV rows and HTML labels.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a sample timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
}

/// Format a size in GiB with exactly two decimals: `"15.50"`.
pub fn format_gib(value: f64) -> String {
    format!("{:.2}", value)
}

/// Hours elapsed from `base` to `ts` (negative if `ts` is earlier).
pub fn hours_since(base: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    (ts - base).num_seconds() as f64 / 3600.0
}
