//! Front matter date parsing.
//!
//! Accepted forms:
//! - `2024-01-15`
//! - `2024-01-15 10:30:00` (or `2024-01-15T10:30:00`)
//! - RFC 3339 (`2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+08:00`)
//!
//! Dates without an offset are taken as UTC.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a front matter date into a UTC timestamp used as the post sort key.
pub fn parse(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc());
    }

    bail!("invalid date `{s}`, expected YYYY-MM-DD or RFC 3339")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only() {
        let dt = parse("2021-03-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2021, 3, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse("2021-03-01 10:30:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (10, 30));

        let dt = parse("2021-03-01T10:30:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_rfc3339_normalizes_offset() {
        let dt = parse("2021-03-01T08:00:00+08:00").unwrap();
        assert_eq!((dt.day(), dt.hour()), (1, 0));
    }

    #[test]
    fn test_ordering() {
        assert!(parse("2021-03-01").unwrap() > parse("2021-02-01").unwrap());
        assert!(parse("2021-01-01 00:00:01").unwrap() > parse("2021-01-01").unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("2021-02-30").is_err());
        assert!(parse("yesterday").is_err());
        assert!(parse("").is_err());
    }
}
