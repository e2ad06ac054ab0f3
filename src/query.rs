// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Validation of user-supplied query values. The command line tool and the
//! HTTP API both go through these functions, so their rules and messages are
//! identical.

use chrono::{Datelike, Days, NaiveDate};

use crate::error::OrreryError;

pub const DEFAULT_DURATION: i64 = 1000;
pub const MAX_DURATION: i64 = 1000;
pub const DEFAULT_INTERVAL: i64 = 5;
pub const MAX_INTERVAL: i64 = 20;

/// Dates are limited to the four-digit-year calendar; 9999-12-31 is the last
/// date we accept or produce.
pub const MAX_YEAR: i32 = 9999;

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, OrreryError> {
    let invalid = || OrreryError::InvalidDate(
        "Invalid date format. Use YYYY-MM-DD.".to_string());
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10 &&
        bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    if date.year() < 1 || date.year() > MAX_YEAR {
        return Err(invalid());
    }
    Ok(date)
}

/// As parse_date(), with `today` used when no date was given. Callers
/// evaluate `today` at request time.
pub fn parse_date_or(value: Option<&str>, today: NaiveDate)
                     -> Result<NaiveDate, OrreryError> {
    match value {
        Some(v) => parse_date(v),
        None => Ok(today),
    }
}

/// Parses a duration or interval. Only plain integers are accepted; "10.0"
/// is an error, not 10. Bounds are checked separately.
pub fn parse_integer(value: Option<&str>, default: i64) -> Result<i64, OrreryError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse::<i64>().map_err(|_| OrreryError::InvalidNumber(
            "Duration and interval must be integers.".to_string())),
    }
}

/// "true" in any letter case is true; anything else, or nothing, is false.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

pub fn check_duration(duration: i64) -> Result<u32, OrreryError> {
    if duration <= 0 || duration > MAX_DURATION {
        return Err(OrreryError::OutOfRange(
            format!("Duration should be between 1-{} days.", MAX_DURATION)));
    }
    Ok(duration as u32)
}

pub fn check_interval(interval: i64) -> Result<u32, OrreryError> {
    if interval <= 0 || interval > MAX_INTERVAL {
        return Err(OrreryError::OutOfRange(
            format!("Interval should be between 1-{} days.", MAX_INTERVAL)));
    }
    Ok(interval as u32)
}

// The frame count cap. Integer division; a ratio equal to MAX_DURATION is
// accepted.
pub fn check_ratio(duration: u32, interval: u32) -> Result<(), OrreryError> {
    if interval == 0 || (duration / interval) as i64 > MAX_DURATION {
        return Err(OrreryError::OutOfRange(
            format!("Duration divided by interval cannot exceed {}.", MAX_DURATION)));
    }
    Ok(())
}

/// `date` plus `days`, failing if the result is past the end of year
/// MAX_YEAR.
pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, OrreryError> {
    match date.checked_add_days(Days::new(days)) {
        Some(result) if result.year() <= MAX_YEAR => Ok(result),
        _ => Err(OrreryError::RangeOverflow(
            format!("Resulting date exceeds the maximum allowed date {}-12-31.",
                    MAX_YEAR))),
    }
}

/// Validated sequence span. Construct with SequenceSpan::validate().
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceSpan {
    pub start: NaiveDate,
    pub duration_days: u32,
    pub interval_days: u32,
}

impl SequenceSpan {
    /// Applies the bounds, ratio and overflow checks, in that order.
    pub fn validate(start: NaiveDate, duration: i64, interval: i64)
                    -> Result<Self, OrreryError> {
        let duration_days = check_duration(duration)?;
        let interval_days = check_interval(interval)?;
        check_ratio(duration_days, interval_days)?;
        add_days(start, duration_days as u64)?;
        Ok(SequenceSpan{start, duration_days, interval_days})
    }
}

// mod tests.
