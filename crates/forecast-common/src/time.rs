//! Timestamp handling for forecast attributes.
//!
//! Forecast feeds publish `PublishTime` and `ValidFrom` in a handful of
//! ISO 8601 flavours, sometimes without an offset and sometimes with
//! fractional seconds. Anything that cannot be read becomes
//! [`Timestamp::Unavailable`] so document builders can print a fallback.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// ISO 8601 layouts with a numeric offset that RFC 3339 rejects (`+0100`).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive layouts tried after the offset layouts, all interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let s = s.trim();

    // Full datetime with offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    // Date only
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimestampParseError::InvalidFormat(s.to_string()))
}

/// A timestamp attribute after a parse-or-default pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    Unavailable,
}

impl Timestamp {
    /// Parse an optional raw attribute; absence and parse failures both
    /// yield `Unavailable`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(parse_timestamp) {
            Some(Ok(dt)) => Timestamp::Valid(dt),
            _ => Timestamp::Unavailable,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }

    /// Format with a strftime pattern, or return `fallback`.
    pub fn format_or(&self, pattern: &str, fallback: &str) -> String {
        match self {
            Timestamp::Valid(dt) => dt.format(pattern).to_string(),
            Timestamp::Unavailable => fallback.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimestampParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
