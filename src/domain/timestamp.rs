//! Timestamp rounding, parsing and calendar helpers.

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::error::ExchangeError;

const NANOS_PER_MILLI: u32 = 1_000_000;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Truncates a timestamp to whole milliseconds.
pub fn round_timestamp(ts: NaiveDateTime) -> NaiveDateTime {
    let nanos = ts.nanosecond();
    ts.with_nanosecond(nanos - nanos % NANOS_PER_MILLI)
        .unwrap_or(ts)
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]` or a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, ExchangeError> {
    let trimmed = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| {
            ExchangeError::invalid(format!(
                "invalid timestamp '{trimmed}', expected YYYY-MM-DD[THH:MM:SS[.fff]]"
            ))
        })
}

/// First instant of the given month and first instant of the following one.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime), ExchangeError> {
    let invalid = || ExchangeError::InvalidDate { year, month };
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = start.checked_add_months(Months::new(1)).ok_or_else(invalid)?;
    Ok((start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
}
