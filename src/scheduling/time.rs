//! Date and time-of-day helpers.
//!
//! Dates travel as `YYYY-MM-DD`, times of day as `HH:MM`, and every
//! comparison happens on those canonical forms or on minutes since midnight.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::{
    error::{AppError, AppResult},
    models::enums::Weekday,
};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Calendar date of `instant` as seen in its own offset, formatted `YYYY-MM-DD`.
///
/// A `DateTime<Local>` at 23:30 on the 3rd gives the 3rd, whatever the UTC
/// date is at that moment.
pub fn to_iso_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format_iso_date(instant.date_naive())
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` string
pub fn parse_iso_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (use YYYY-MM-DD)", value)))
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday().into()
}

pub fn weekday_of_iso(value: &str) -> AppResult<Weekday> {
    parse_iso_date(value).map(weekday_of)
}

/// Convert `HH:MM` to minutes since midnight.
pub fn to_minutes(hhmm: &str) -> AppResult<u32> {
    let invalid = || AppError::Validation(format!("Invalid time '{}' (use HH:MM)", hhmm));

    let (hours, minutes) = hhmm.split_once(':').ok_or_else(invalid)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Convert minutes since midnight back to `HH:MM`.
///
/// # Panics
///
/// Panics if `minutes` is not within a single day (`0..1440`).
pub fn from_minutes(minutes: u32) -> String {
    assert!(
        minutes < MINUTES_PER_DAY,
        "minutes out of range for a single day: {}",
        minutes
    );
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// `date` at `minutes` past midnight
pub fn at_minutes(date: NaiveDate, minutes: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + chrono::Duration::minutes(i64::from(minutes))
}
