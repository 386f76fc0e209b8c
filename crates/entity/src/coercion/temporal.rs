//! Date and time parsing helpers

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::ValueError;

/// A parsed date-time and whether the text carried its own offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedDateTime {
    pub value: DateTime<FixedOffset>,
    pub has_offset: bool,
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse date-time text in the common database and ISO-8601 shapes.
///
/// Text without an offset is read as UTC; a bare date is read as midnight UTC.
pub fn parse_datetime(text: &str) -> Option<ParsedDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedDateTime { value, has_offset: true });
    }

    for format in OFFSET_FORMATS {
        if let Ok(value) = DateTime::parse_from_str(text, format) {
            return Some(ParsedDateTime { value, has_offset: true });
        }
    }

    // "Z" or " UTC" suffix on an otherwise naive timestamp
    let (naive_text, utc_suffix) = match text
        .strip_suffix(" UTC")
        .or_else(|| text.strip_suffix('Z'))
        .or_else(|| text.strip_suffix('z'))
    {
        Some(stripped) => (stripped, true),
        None => (text, false),
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
            return Some(ParsedDateTime {
                value: as_utc(&naive),
                has_offset: utc_suffix,
            });
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(naive_text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Some(ParsedDateTime {
            value: as_utc(&midnight),
            has_offset: utc_suffix,
        });
    }

    if let Ok(value) = DateTime::parse_from_rfc2822(text) {
        return Some(ParsedDateTime { value, has_offset: true });
    }

    None
}

/// Parse text written with a chrono format string.
///
/// Formats without an offset read as UTC and date-only formats as midnight.
pub fn parse_with_format(text: &str, format: &str) -> Option<ParsedDateTime> {
    let text = text.trim();

    if let Ok(value) = DateTime::parse_from_str(text, format) {
        return Some(ParsedDateTime { value, has_offset: true });
    }

    let naive = NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })?;

    Some(ParsedDateTime {
        value: as_utc(&naive),
        has_offset: false,
    })
}

/// Interpret a naive date-time as UTC
pub fn as_utc(naive: &NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(naive).into()
}

/// Parse a bare time of day (`10:30`, `10:30:15`, `10:30:15.250`)
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Seconds since the Unix epoch, fractions allowed
pub fn from_epoch(seconds: f64) -> Result<DateTime<Utc>, ValueError> {
    if !seconds.is_finite() {
        return Err(ValueError::new(seconds, "not a finite epoch timestamp"));
    }

    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(ValueError::new(seconds, "epoch timestamp out of range"));
    }

    Utc.timestamp_opt(whole as i64, nanos)
        .single()
        .ok_or_else(|| ValueError::new(seconds, "epoch timestamp out of range"))
}

/// Whole seconds since the Unix epoch
pub fn from_epoch_seconds(seconds: i64) -> Result<DateTime<Utc>, ValueError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ValueError::new(seconds, "epoch timestamp out of range"))
}

/// Render a timestamp with a chrono format string, reporting bad formats as errors
pub fn format<Tz>(value: &DateTime<Tz>, format: &str) -> Result<String, ValueError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", value.format(format))
        .map_err(|_| ValueError::new(format, "invalid date-time format string"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_database_datetime() {
        let parsed = parse_datetime("2024-03-05 10:20:30").unwrap();
        assert!(!parsed.has_offset);
        assert_eq!(parsed.value.offset().local_minus_utc(), 0);
        assert_eq!(parsed.value.hour(), 10);
        assert_eq!(parsed.value.second(), 30);
    }

    #[test]
    fn test_parse_with_offset() {
        let parsed = parse_datetime("2024-03-05T10:20:30+02:00").unwrap();
        assert!(parsed.has_offset);
        assert_eq!(parsed.value.offset().local_minus_utc(), 7200);

        let parsed = parse_datetime("2024-03-05 10:20:30+0530").unwrap();
        assert_eq!(parsed.value.offset().local_minus_utc(), 19800);
    }

    #[test]
    fn test_parse_utc_suffix() {
        let parsed = parse_datetime("2024-03-05 10:20:30Z").unwrap();
        assert!(parsed.has_offset);
        assert_eq!(parsed.value.hour(), 10);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_datetime("2024-03-05 10:20:30.250").unwrap();
        assert_eq!(parsed.value.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_datetime("2024-03-05").unwrap();
        assert_eq!(parsed.value.day(), 5);
        assert_eq!(parsed.value.hour(), 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("2024-13-45").is_none());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("10:30"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(parse_time_of_day("23:59:59"), NaiveTime::from_hms_opt(23, 59, 59));
        assert!(parse_time_of_day("25:00").is_none());
    }

    #[test]
    fn test_from_epoch() {
        let ts = from_epoch(1_700_000_000.5).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);

        let ts = from_epoch(-1.5).unwrap();
        assert_eq!(ts.timestamp(), -2);
        assert_eq!(ts.timestamp_subsec_millis(), 500);

        assert!(from_epoch(f64::NAN).is_err());
        assert!(from_epoch(1e20).is_err());
    }

    #[test]
    fn test_parse_with_format() {
        let parsed = parse_with_format("05/03/2024", "%d/%m/%Y").unwrap();
        assert!(!parsed.has_offset);
        assert_eq!((parsed.value.day(), parsed.value.month(), parsed.value.hour()), (5, 3, 0));

        let parsed = parse_with_format("05.03.2024 10:20", "%d.%m.%Y %H:%M").unwrap();
        assert_eq!(parsed.value.minute(), 20);

        let parsed = parse_with_format("2024-03-05 10:20:30 +0200", "%Y-%m-%d %H:%M:%S %z").unwrap();
        assert!(parsed.has_offset);
        assert_eq!(parsed.value.offset().local_minus_utc(), 7200);

        assert!(parse_with_format("2024-03-05", "%d/%m/%Y").is_none());
    }

    #[test]
    fn test_format() {
        let ts = from_epoch_seconds(1_700_000_000).unwrap();
        assert_eq!(format(&ts, "%Y-%m-%d %H:%M:%S").unwrap(), "2023-11-14 22:13:20");
    }
}
