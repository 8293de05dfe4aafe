//! Day-closure evaluation: has a business day ended, and was anyone working

use chrono::{NaiveDate, NaiveDateTime};

use super::time::{at_minutes, to_minutes, weekday_of};
use crate::{error::AppResult, models::WorkingHours};

/// Whether at least one professional has an active day with blocks on `date`
pub fn has_schedule_on_date<'a>(
    date: NaiveDate,
    all_hours: impl IntoIterator<Item = &'a WorkingHours>,
) -> bool {
    let weekday = weekday_of(date);
    all_hours.into_iter().any(|hours| hours.works_on(weekday))
}

/// Latest block end, in minutes, across every professional working on `date`
pub fn latest_shift_end<'a>(
    date: NaiveDate,
    all_hours: impl IntoIterator<Item = &'a WorkingHours>,
) -> AppResult<Option<u32>> {
    let weekday = weekday_of(date);
    let mut latest = None;
    for hours in all_hours {
        latest = latest.max(hours.shift_end(weekday)?);
    }
    Ok(latest)
}

/// Whether the business day `date` is over at `now`.
///
/// A day nobody is scheduled on counts as over.
pub fn is_day_over<'a>(
    date: NaiveDate,
    all_hours: impl IntoIterator<Item = &'a WorkingHours>,
    now: NaiveDateTime,
) -> AppResult<bool> {
    Ok(match latest_shift_end(date, all_hours)? {
        Some(end) => now > at_minutes(date, end),
        None => true,
    })
}

/// Whether a booking at `date` `time` is behind us at `now`.
///
/// When the shift end is known the booking is judged against whichever is
/// later, its own start or the end of the shift; otherwise against its start.
pub fn has_appointment_expired(
    date: NaiveDate,
    time: &str,
    schedule_end_override: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<bool> {
    let start = to_minutes(time)?;
    let threshold = match schedule_end_override {
        Some(end) => start.max(to_minutes(end)?),
        None => start,
    };
    Ok(now > at_minutes(date, threshold))
}
