//! Lenient timestamp parsing for raw admission/discharge cells.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a raw cell into a timestamp. Empty or unrecognised text yields `None`,
/// which downstream code treats as "not a value".
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    // Compact dates are only accepted when they are exactly eight digits
    for format in DATE_FORMATS {
        if *format == "%Y%m%d" && !(s.len() == 8 && s.chars().all(|c| c.is_ascii_digit())) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Whole days of a time delta, floored towards negative infinity.
///
/// A gap of minus two hours is `-1` days, not `0`.
#[must_use]
pub fn floor_days(delta: TimeDelta) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}
