//! UTC date strings in the `Thu, 01 Jan 1970 00:00:00 GMT` form used by
//! entry envelopes and cookie `expires` attributes.

use chrono::{DateTime, NaiveDateTime, Utc};

const UTC_STRING_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The date written into cookies that should be deleted.
pub(crate) const EPOCH_UTC_STRING: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Formats `at` with second precision.
pub fn format_utc(at: &DateTime<Utc>) -> String {
    at.format(UTC_STRING_FORMAT).to_string()
}

/// Parses a UTC date string. Accepts the `GMT` form written by
/// [`format_utc`], the `UTC` suffix some writers use, and RFC 3339.
pub fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Some(head) = text.strip_suffix(" UTC").or_else(|| text.strip_suffix(" GMT")) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(head, "%a, %d %b %Y %H:%M:%S") {
            return Some(naive.and_utc());
        }
    }
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
