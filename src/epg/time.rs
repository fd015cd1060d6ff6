//! Timestamp handling: XMLTV canonical form and the ISO 8601 variants sources emit

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Canonical XMLTV layout: `YYYYMMDDHHmmss ±HHMM`
const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Format a timestamp in canonical XMLTV form, keeping its own offset.
pub fn format_xmltv_time(ts: &DateTime<FixedOffset>) -> String {
    ts.format(XMLTV_FORMAT).to_string()
}

/// Parse XMLTV time: "20240115120000 +0000", "20240115120000+0100" or a bare
/// "20240115120000" (read as UTC).
pub fn parse_xmltv_time(time_str: &str) -> Option<DateTime<FixedOffset>> {
    let time_str = time_str.trim();
    let datetime = time_str.get(..14)?;
    if !datetime.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(datetime, "%Y%m%d%H%M%S").ok()?;
    let offset = parse_tz_offset(time_str[14..].trim())?;
    offset.from_local_datetime(&naive).single()
}

/// Parse timezone offset like "+0100", "-05:30" or "" (UTC)
fn parse_tz_offset(tz: &str) -> Option<FixedOffset> {
    if tz.is_empty() {
        return FixedOffset::east_opt(0);
    }

    let sign = match tz.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = tz[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse the ISO 8601 shapes JSON APIs and page markup use.
///
/// An explicit offset is kept as given. Timestamps without one are read as UTC.
pub fn parse_iso_time(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(ts) = DateTime::parse_from_str(value, layout) {
            return Some(ts);
        }
    }
    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

/// Unix seconds as a UTC timestamp
pub fn from_unix_secs(secs: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_opt(secs, 0).single().map(|ts| ts.fixed_offset())
}
