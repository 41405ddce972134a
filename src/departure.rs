//! Departure instants, countdowns and severity buckets.
//!
//! Trips carry a local date (`YYYY-MM-DD`) and time (`HH:MM`) that are read
//! at one fixed UTC offset. No timezone database is consulted, so daylight
//! saving never shifts a departure.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppError;

/// Brasília time, `-03:00`.
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = -3 * 3600;

const MINUTE_MS: i64 = 60_000;
const CRITICAL_WINDOW_MS: i64 = 10 * MINUTE_MS;
const WARNING_WINDOW_MS: i64 = 30 * MINUTE_MS;

const PASSED_TEXT: &str = "Já passou";
const REMAINING_PREFIX: &str = "Faltam";

pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECONDS).expect("-03:00 is a valid offset")
}

/// Parses an offset written as `+HH:MM` or `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, AppError> {
    let invalid = || AppError::Config(format!("invalid utc offset {raw:?}, expected ±HH:MM"));
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Reads `date` + `time` (seconds pinned to zero) at `offset`.
pub fn parse_local_departure(
    date: &str,
    time: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, AppError> {
    let invalid = || AppError::InvalidDeparture {
        date: date.to_string(),
        time: time.to_string(),
    };
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let clock = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| invalid())?;
    offset
        .from_local_datetime(&NaiveDateTime::new(day, clock))
        .single()
        .ok_or_else(invalid)
}

/// Signed milliseconds from `now` until `departure`.
pub fn millis_until(departure: &DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    departure.timestamp_millis() - now.timestamp_millis()
}

/// Today's date at `offset`, in the `YYYY-MM-DD` form used by date inputs.
pub fn today_in(offset: FixedOffset, now: DateTime<Utc>) -> String {
    now.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

pub fn format_clock(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset)
        .format("%d/%m/%Y - %H:%M:%S")
        .to_string()
}

pub fn format_departure(departure: &DateTime<FixedOffset>) -> String {
    departure.format("%d/%m/%Y, %H:%M").to_string()
}

/// Time left until a departure, reduced to its two most significant units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Passed,
    Days { days: i64, hours: i64 },
    Hours { hours: i64, minutes: i64 },
    Minutes { minutes: i64, seconds: i64 },
    Seconds(i64),
}

impl Countdown {
    pub fn from_millis(diff_ms: i64) -> Self {
        if diff_ms <= 0 {
            return Countdown::Passed;
        }
        let total_seconds = diff_ms / 1000;
        let days = total_seconds / 86_400;
        let hours = (total_seconds % 86_400) / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if days > 0 {
            Countdown::Days { days, hours }
        } else if hours > 0 {
            Countdown::Hours { hours, minutes }
        } else if minutes > 0 {
            Countdown::Minutes { minutes, seconds }
        } else {
            Countdown::Seconds(seconds)
        }
    }

    /// First line of the two-line rendering.
    pub fn prefix(&self) -> &'static str {
        match self {
            Countdown::Passed => PASSED_TEXT,
            _ => REMAINING_PREFIX,
        }
    }

    /// Second line; empty once the departure has passed.
    pub fn rest(&self) -> String {
        match *self {
            Countdown::Passed => String::new(),
            Countdown::Days { days, hours } => format!("{days}d {hours}h"),
            Countdown::Hours { hours, minutes } => format!("{hours}h {minutes}m"),
            Countdown::Minutes { minutes, seconds } => format!("{minutes}m {seconds}s"),
            Countdown::Seconds(seconds) => format!("{seconds}s"),
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Passed => f.write_str(PASSED_TEXT),
            _ => write!(f, "{} {}", REMAINING_PREFIX, self.rest()),
        }
    }
}

pub fn format_countdown(diff_ms: i64) -> String {
    Countdown::from_millis(diff_ms).to_string()
}

/// Color bucket of a trip card. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Past,
    Critical,
    Warning,
    Normal,
}

impl Severity {
    pub fn from_millis(diff_ms: i64) -> Self {
        if diff_ms < 0 {
            Severity::Past
        } else if diff_ms <= CRITICAL_WINDOW_MS {
            Severity::Critical
        } else if diff_ms <= WARNING_WINDOW_MS {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Past => "past",
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Normal => "normal",
        }
    }

    pub fn card_class(&self) -> &'static str {
        match self {
            Severity::Past => "bg-gray-700 text-gray-200 opacity-80",
            Severity::Critical => "bg-red-600 text-white",
            Severity::Warning => "bg-yellow-400 text-gray-900",
            Severity::Normal => "bg-green-400 text-gray-900",
        }
    }

    /// Passenger label color; only the red card needs light text.
    pub fn text_class(&self) -> &'static str {
        match self {
            Severity::Critical => "text-white",
            _ => "text-black",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    #[test]
    fn departure_is_read_at_minus_three() {
        let departure = parse_local_departure("2024-01-01", "10:00", default_offset()).unwrap();
        assert_eq!(departure.with_timezone(&Utc), utc("2024-01-01T13:00:00Z"));
    }

    #[test]
    fn departure_crosses_midnight_in_utc() {
        let departure = parse_local_departure("2024-12-31", "22:30", default_offset()).unwrap();
        assert_eq!(departure.with_timezone(&Utc), utc("2025-01-01T01:30:00Z"));
    }

    #[test]
    fn rejects_malformed_departures() {
        let offset = default_offset();
        assert!(parse_local_departure("2024-13-01", "10:00", offset).is_err());
        assert!(parse_local_departure("2024-01-01", "25:00", offset).is_err());
        assert!(parse_local_departure("", "10:00", offset).is_err());
        assert!(parse_local_departure("2024-01-01", "", offset).is_err());
    }

    #[test]
    fn countdown_picks_two_most_significant_units() {
        assert_eq!(format_countdown(90_000_000), "Faltam 1d 1h");
        assert_eq!(format_countdown(3_723_000), "Faltam 1h 2m");
        assert_eq!(format_countdown(125_000), "Faltam 2m 5s");
        assert_eq!(format_countdown(5_000), "Faltam 5s");
        assert_eq!(format_countdown(999), "Faltam 0s");
    }

    #[test]
    fn countdown_skips_zero_leading_units_only() {
        assert_eq!(format_countdown(86_400_000), "Faltam 1d 0h");
        assert_eq!(format_countdown(3_600_000), "Faltam 1h 0m");
        assert_eq!(format_countdown(60_000), "Faltam 1m 0s");
    }

    #[test]
    fn countdown_sentinel_for_non_positive() {
        assert_eq!(format_countdown(0), "Já passou");
        assert_eq!(format_countdown(-1), "Já passou");
        let passed = Countdown::from_millis(-60_000);
        assert_eq!(passed.prefix(), "Já passou");
        assert!(passed.rest().is_empty());
    }

    #[test]
    fn countdown_splits_into_prefix_and_rest() {
        let countdown = Countdown::from_millis(90_000_000);
        assert_eq!(countdown.prefix(), "Faltam");
        assert_eq!(countdown.rest(), "1d 1h");
    }

    #[test]
    fn severity_bounds_are_inclusive() {
        assert_eq!(Severity::from_millis(-1), Severity::Past);
        assert_eq!(Severity::from_millis(0), Severity::Critical);
        assert_eq!(Severity::from_millis(600_000), Severity::Critical);
        assert_eq!(Severity::from_millis(601_000), Severity::Warning);
        assert_eq!(Severity::from_millis(1_800_000), Severity::Warning);
        assert_eq!(Severity::from_millis(1_801_000), Severity::Normal);
    }

    #[test]
    fn offsets_parse_both_signs() {
        assert_eq!(parse_utc_offset("-03:00").unwrap(), default_offset());
        assert_eq!(
            parse_utc_offset("+05:30").unwrap(),
            FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert!(parse_utc_offset("03:00").is_err());
        assert!(parse_utc_offset("-3:00").is_err());
        assert!(parse_utc_offset("-03:75").is_err());
    }

    #[test]
    fn clock_and_today_follow_the_offset() {
        let now = utc("2024-03-01T02:15:09Z");
        assert_eq!(today_in(default_offset(), now), "2024-02-29");
        assert_eq!(format_clock(now, default_offset()), "29/02/2024 - 23:15:09");
    }
}
