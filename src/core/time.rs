//! UTC timestamp helpers shared by every log and store.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with microseconds, e.g.
/// `2026-10-16T09:30:00.123456+00:00`.
pub fn utc_now_iso() -> String {
    format_iso(Utc::now())
}

pub fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO-8601 timestamp. A trailing `Z` and explicit offsets are
/// honoured; naive timestamps are taken as UTC. Returns `None` when the
/// string is not a timestamp at all.
pub fn parse_iso(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}
