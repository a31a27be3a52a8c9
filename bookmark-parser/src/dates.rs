//! Timestamp decoding for both export formats
//!
//! Invalid or future timestamps are treated as absent rather than clamped.

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 (Chrome/Windows epoch) and 1970-01-01
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Parse a Netscape `ADD_DATE` value (seconds since the Unix epoch).
/// Accepted only when it is a positive integer not later than `now`.
pub fn parse_unix_seconds(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds: i64 = raw.trim().parse().ok()?;
    if seconds <= 0 || seconds > now.timestamp() {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

/// Parse a Chrome timestamp (microseconds since January 1, 1601)
pub fn parse_chrome_timestamp(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let micros: i64 = raw.trim().parse().ok()?;
    let unix_seconds = (micros / 1_000_000) - WINDOWS_EPOCH_OFFSET_SECS;
    if micros <= 0 || unix_seconds <= 0 || unix_seconds > now.timestamp() {
        return None;
    }
    DateTime::from_timestamp(unix_seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_unix_seconds_accepts_past_dates() {
        let parsed = parse_unix_seconds("1000000000", now()).unwrap();
        assert_eq!(parsed.timestamp(), 1_000_000_000);
    }

    #[test]
    fn test_unix_seconds_rejects_invalid_values() {
        assert!(parse_unix_seconds("0", now()).is_none());
        assert!(parse_unix_seconds("-5", now()).is_none());
        assert!(parse_unix_seconds("soon", now()).is_none());
        assert!(parse_unix_seconds("1700000001", now()).is_none());
    }

    #[test]
    fn test_chrome_timestamp_parsing() {
        // 2023-11-14T22:13:20Z expressed in Chrome's epoch
        let micros = (1_700_000_000i64 + WINDOWS_EPOCH_OFFSET_SECS) * 1_000_000;
        let parsed = parse_chrome_timestamp(&micros.to_string(), now()).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert!(parse_chrome_timestamp("0", now()).is_none());
        assert!(parse_chrome_timestamp("13999999999999999", now()).is_none());
    }
}
