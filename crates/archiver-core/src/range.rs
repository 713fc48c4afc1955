//! Turn user-supplied civil dates into a UTC query window.
//!
//! Dates are `YYYY-MM-DD` and are interpreted in the user's timezone. The
//! resulting window is half-open, `[start, end)`. Both dates are shifted
//! forward by one day: `--end-date 2024-06-10` covers the whole of June
//! 10th, while `--start-date 2024-06-10` starts at June 11th 00:00 local.
//! Consequently `--start-date D --end-date D` selects nothing.
//!
//! | start | end | window |
//! |-------|-----|--------|
//! | absent | absent | `[today UTC 00:00 + 1d - (span + 1)d, today UTC 00:00 + 1d)` |
//! | given | absent | `[local midnight of start + 1d, today UTC 00:00 + 1d)` |
//! | absent | given | `[local midnight of end + 1d - (span + 1)d, local midnight of end + 1d)` |
//! | given | given | `[local midnight of start + 1d, local midnight of end + 1d)` |

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use archiver_types::QueryWindow;

use crate::error::{Error, Result};

/// Accepted civil date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Look up an IANA timezone by name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimezone(name.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDateFormat(value.to_string()))
}

/// The UTC instant of local midnight at the start of `date` in `tz`.
///
/// When midnight is ambiguous (clocks fall back across it) the earlier
/// instant is used. When midnight does not exist (clocks jump forward
/// across it) the first valid local time after the gap is used.
pub fn civil_midnight_utc(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    if let Some(instant) = tz.from_local_datetime(&midnight).earliest() {
        return instant.with_timezone(&Utc);
    }

    // Gaps are whole minutes and at most a day long.
    (1..=24 * 60)
        .filter_map(|minutes| midnight.checked_add_signed(TimeDelta::minutes(minutes)))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|instant| instant.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// `instant` moved by `days`, or [`Error::RangeOutOfBounds`].
fn shift_days(instant: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(days)
        .and_then(|delta| instant.checked_add_signed(delta))
        .ok_or_else(|| Error::RangeOutOfBounds(format!("{} shifted by {} day(s)", instant, days)))
}

/// Midnight UTC at the start of the day after `now`'s UTC date.
fn end_of_today_utc(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    shift_days(now.date_naive().and_time(NaiveTime::MIN).and_utc(), 1)
}

/// Resolve optional start and end dates into a half-open UTC window.
///
/// Empty strings count as absent. The timezone is only looked up when a
/// date needs it, so an unset or bogus zone does not break the default
/// window. A start date after the end date yields an empty window.
pub fn resolve(
    start_date: Option<&str>,
    end_date: Option<&str>,
    default_span_days: u32,
    timezone: &str,
    now: DateTime<Utc>,
) -> Result<QueryWindow> {
    let start_date = start_date.filter(|s| !s.trim().is_empty());
    let end_date = end_date.filter(|s| !s.trim().is_empty());

    let start_day = start_date.map(parse_date).transpose()?;
    let end_day = end_date.map(parse_date).transpose()?;
    let tz = if start_day.is_some() || end_day.is_some() {
        Some(parse_timezone(timezone)?)
    } else {
        None
    };

    let end = match (end_day, &tz) {
        (Some(day), Some(tz)) => shift_days(civil_midnight_utc(day, tz), 1)?,
        _ => end_of_today_utc(now)?,
    };

    let start = match (start_day, &tz) {
        (Some(day), Some(tz)) => shift_days(civil_midnight_utc(day, tz), 1)?,
        _ => shift_days(end, -(i64::from(default_span_days) + 1))?,
    };

    // An inverted request selects nothing.
    let start = start.min(end);
    debug!("Resolved window [{}, {})", start, end);

    QueryWindow::from_datetimes(start, end).map_err(|e| Error::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // 2024-06-10 15:30 UTC
        DateTime::parse_from_rfc3339("2024-06-10T15:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ts(rfc3339: &str) -> i64 {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().timestamp()
    }

    #[test]
    fn test_default_window() {
        let window = resolve(None, None, 3, "Europe/Rome", now()).unwrap();
        assert_eq!(window.start(), ts("2024-06-07T00:00:00Z"));
        assert_eq!(window.end(), ts("2024-06-11T00:00:00Z"));
    }

    #[test]
    fn test_both_dates_in_local_zone() {
        let window = resolve(
            Some("2024-06-01"),
            Some("2024-06-02"),
            3,
            "Europe/Rome",
            now(),
        )
        .unwrap();
        assert_eq!(window.start(), ts("2024-06-01T22:00:00Z"));
        assert_eq!(window.end(), ts("2024-06-02T22:00:00Z"));
    }

    #[test]
    fn test_same_start_and_end_date_is_empty() {
        let window = resolve(Some("2024-06-05"), Some("2024-06-05"), 3, "UTC", now()).unwrap();
        assert!(window.is_empty());
        assert_eq!(window.start(), ts("2024-06-06T00:00:00Z"));
    }

    #[test]
    fn test_end_only_uses_span() {
        let window = resolve(None, Some("2024-06-02"), 1, "UTC", now()).unwrap();
        assert_eq!(window.end(), ts("2024-06-03T00:00:00Z"));
        assert_eq!(window.start(), ts("2024-06-01T00:00:00Z"));
    }

    #[test]
    fn test_start_only_ends_tomorrow_utc() {
        let window = resolve(Some("2024-06-09"), None, 3, "America/New_York", now()).unwrap();
        assert_eq!(window.start(), ts("2024-06-10T04:00:00Z"));
        assert_eq!(window.end(), ts("2024-06-11T00:00:00Z"));
    }

    #[test]
    fn test_zero_span_covers_one_day() {
        let window = resolve(None, None, 0, "UTC", now()).unwrap();
        assert_eq!(window.end() - window.start(), 86_400);
    }

    #[test]
    fn test_huge_span_is_an_error() {
        let err = resolve(None, None, 200_000_000, "UTC", now()).unwrap_err();
        assert!(matches!(err, Error::RangeOutOfBounds(_)));

        let window = resolve(None, None, u32::MAX, "UTC", now());
        assert!(window.is_err());
    }

    #[test]
    fn test_day_after_last_date_is_an_error() {
        let last = civil_midnight_utc(NaiveDate::MAX, &chrono_tz::UTC);
        assert!(matches!(shift_days(last, 1), Err(Error::RangeOutOfBounds(_))));
        assert_eq!(shift_days(last, -1).unwrap(), last - TimeDelta::days(1));
    }

    #[test]
    fn test_invalid_date() {
        let err = resolve(Some("2024-13-01"), None, 3, "UTC", now()).unwrap_err();
        assert!(matches!(err, Error::InvalidDateFormat(ref s) if s == "2024-13-01"));

        let err = resolve(None, Some("yesterday"), 3, "UTC", now()).unwrap_err();
        assert!(matches!(err, Error::InvalidDateFormat(_)));
    }

    #[test]
    fn test_unknown_timezone_only_when_needed() {
        assert!(resolve(None, None, 3, "Mars/Olympus", now()).is_ok());
        let err = resolve(Some("2024-06-01"), None, 3, "Mars/Olympus", now()).unwrap_err();
        assert!(matches!(err, Error::UnknownTimezone(_)));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let a = resolve(Some(""), Some("  "), 3, "UTC", now()).unwrap();
        let b = resolve(None, None, 3, "UTC", now()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inverted_dates_select_nothing() {
        let window = resolve(Some("2024-06-05"), Some("2024-06-01"), 3, "UTC", now()).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_midnight_in_dst_gap() {
        // Santiago skipped 2022-09-11 00:00..01:00 local.
        let tz = parse_timezone("America/Santiago").unwrap();
        let day = parse_date("2022-09-11").unwrap();
        let instant = civil_midnight_utc(day, &tz);
        assert_eq!(instant.timestamp(), ts("2022-09-11T01:00:00-03:00"));
    }

    #[test]
    fn test_ambiguous_midnight_takes_earliest() {
        // Havana fell back from 01:00 to 00:00 on 2022-11-06.
        let tz = parse_timezone("America/Havana").unwrap();
        let day = parse_date("2022-11-06").unwrap();
        let instant = civil_midnight_utc(day, &tz);
        assert_eq!(instant.timestamp(), ts("2022-11-06T00:00:00-04:00"));
    }

    #[test]
    fn test_parse_timezone_trims() {
        assert_eq!(parse_timezone(" Europe/Rome ").unwrap(), chrono_tz::Europe::Rome);
    }
}
