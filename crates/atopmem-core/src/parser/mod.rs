//! Line classifier for atop text output.
//!
//! Recognizes the three line shapes the report needs:
//!
//! ```text
//! ATOP - myhost          2024/01/15  10:00:00   --------------   10s elapsed
//! MEM | tot    15.5G | free    1.2G | cache   8.0G | buff  512.0M | ...
//! SWP | tot     2.0G | free    1.9G |              | vmcom  12.1G | ...
//! ```
//!
//! Everything else is `Unrecognized`. Like the rest of the parsers in this
//! crate, matching is done by scanning for fixed keywords rather than with
//! regular expressions.

pub mod units;

use chrono::NaiveDateTime;

pub use units::{Magnitude, SizeUnit, normalize};

/// Marker that starts an atop sample header line.
const TIMESTAMP_MARKER: &str = "ATOP - ";
const MEMORY_MARKER: &str = "MEM";
const SWAP_MARKER: &str = "SWP";

/// chrono format of the date and time tokens in the header line.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// `total` and `free` magnitudes from a MEM or SWP line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageReading {
    pub total: Magnitude,
    pub free: Magnitude,
}

impl UsageReading {
    /// `(total, free)` in gibibytes.
    pub fn to_gib(self) -> (f64, f64) {
        (self.total.to_gib(), self.free.to_gib())
    }
}

/// Classification of one log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    Timestamp(NaiveDateTime),
    Memory(UsageReading),
    Swap(UsageReading),
    Unrecognized,
}

/// Classifies a single line. Never fails: anything malformed is `Unrecognized`.
pub fn classify_line(line: &str) -> LineKind {
    if let Some(ts) = parse_timestamp(line) {
        return LineKind::Timestamp(ts);
    }
    if let Some(reading) = parse_usage(line, MEMORY_MARKER) {
        return LineKind::Memory(reading);
    }
    if let Some(reading) = parse_usage(line, SWAP_MARKER) {
        return LineKind::Swap(reading);
    }
    LineKind::Unrecognized
}

/// Parses `ATOP - <host> YYYY/MM/DD HH:MM:SS ...`.
fn parse_timestamp(line: &str) -> Option<NaiveDateTime> {
    let rest = line.trim_start().strip_prefix(TIMESTAMP_MARKER)?;
    // Host name must follow the marker directly.
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let _host = tokens.next()?;
    let date = tokens.next()?;
    let time = tokens.next()?;

    if !has_shape(date, "dddd/dd/dd") || !has_shape(time, "dd:dd:dd") {
        return None;
    }

    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), TIMESTAMP_FORMAT).ok()
}

/// Checks `s` against a template where `d` is any ASCII digit and every
/// other character must match literally.
fn has_shape(s: &str, template: &str) -> bool {
    s.len() == template.len()
        && s.bytes().zip(template.bytes()).all(|(c, t)| match t {
            b'd' => c.is_ascii_digit(),
            _ => c == t,
        })
}

/// Parses `<marker> | tot <num><unit> | free <num><unit> ...`.
fn parse_usage(line: &str, marker: &str) -> Option<UsageReading> {
    let rest = line.trim_start().strip_prefix(marker)?;
    let mut fields = rest.split('|');

    // Only whitespace may sit between the marker and the first separator.
    if !fields.next()?.trim().is_empty() {
        return None;
    }

    let total = labeled_magnitude(fields.next()?, "tot")?;
    let free = labeled_magnitude(fields.next()?, "free")?;

    Some(UsageReading { total, free })
}

/// Parses a `label <num><unit>` field.
fn labeled_magnitude(field: &str, label: &str) -> Option<Magnitude> {
    let rest = field.trim().strip_prefix(label)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    parse_magnitude(rest.trim_start())
}

/// Parses a token like `15.5G` or `512.0M`.
fn parse_magnitude(token: &str) -> Option<Magnitude> {
    let (unit_start, _) = token.char_indices().last()?;
    let (number, unit) = token.split_at(unit_start);

    let unit = SizeUnit::from_token(unit)?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = number.parse::<f64>().ok()?;

    Some(Magnitude { value, unit })
}
