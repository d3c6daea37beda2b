//! Naive local timestamp helpers.
//!
//! Blocks are stored with naive local ISO-8601 timestamps
//! (`YYYY-MM-DDTHH:MM:SS[.ffffff]`) so that:
//! - Lexicographic ordering matches chronological ordering
//! - A day-prefix match on `start` selects the user's calendar day

use chrono::NaiveDateTime;

/// Formats a timestamp for storage.
///
/// The fractional part is printed only when non-zero, matching the parse side.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Parses a stored timestamp, returning `None` on malformed input.
///
/// Callers are expected to degrade gracefully on `None` rather than fail the
/// surrounding operation.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.trim().parse().ok()
}

/// Converts a timestamp to epoch milliseconds for display arithmetic.
///
/// Naive timestamps are interpreted on a fixed (UTC) basis. All consumers use
/// this same conversion, so differences and window clipping are consistent
/// even though the absolute epoch is offset from the local zone.
pub fn epoch_millis(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_millis()
}
