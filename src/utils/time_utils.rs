use chrono::{DateTime, TimeZone, Utc};

// Everything is stored as unix timestamps in SQLite and only
// turned into RFC 3339 strings at the DTO boundary.

pub fn current_timestamp() -> i64 {
  Utc::now().timestamp()
}

pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.to_rfc3339(),
    // Out of range timestamps shouldn't happen with our own data:
    None => String::new(),
  }
}

/// Parse an RFC 3339 date string (what the admin UI sends for
/// completedAt) into a unix timestamp.
pub fn parse_rfc3339(value: &str) -> Option<i64> {
  DateTime::parse_from_rfc3339(value)
    .ok()
    .map(|d| d.timestamp())
}
