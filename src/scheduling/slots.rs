//! Bookable slot calculation

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::time::{from_minutes, minutes_of_day, weekday_of, MINUTES_PER_DAY};
use crate::{
    error::{AppError, AppResult},
    models::{Booking, WorkingHours},
};

/// Already-occupied half-open interval `[start, end)`, minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start: u32,
    pub end: u32,
}

impl BookedInterval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        start < self.end && end > self.start
    }
}

impl TryFrom<&Booking> for BookedInterval {
    type Error = AppError;

    fn try_from(booking: &Booking) -> Result<Self, Self::Error> {
        let (start, end) = booking.interval()?;
        Ok(Self { start, end })
    }
}

/// A service must last at least a minute and fit in a single day
pub fn check_service_duration(service_duration: u32) -> AppResult<()> {
    if service_duration == 0 {
        return Err(AppError::Validation(
            "Service duration must be at least 1 minute".to_string(),
        ));
    }
    if service_duration > MINUTES_PER_DAY {
        return Err(AppError::Validation(format!(
            "Service duration must not exceed {} minutes",
            MINUTES_PER_DAY
        )));
    }
    Ok(())
}

/// Start times (`HH:MM`) at which a service of `service_duration` minutes can
/// be booked on `date`.
///
/// Each open block is walked from its start, stepping by the day's minimum
/// gap when one is configured and by the service duration otherwise, while
/// the whole service still fits before the block ends. Candidates overlapping
/// a booked interval are dropped, and on `now`'s own date so is every
/// candidate not strictly after the current time of day.
///
/// The result is ascending and free of duplicates even when blocks overlap or
/// are listed out of order. An empty result means no availability.
pub fn compute_available_slots(
    date: NaiveDate,
    working_hours: &WorkingHours,
    booked: &[BookedInterval],
    service_duration: u32,
    now: NaiveDateTime,
) -> AppResult<Vec<String>> {
    check_service_duration(service_duration)?;

    let weekday = weekday_of(date);
    let blocks = working_hours.open_blocks(weekday);
    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let step = match working_hours.gap_for(weekday) {
        0 => service_duration,
        gap => gap,
    };
    let not_after = (date == now.date()).then(|| minutes_of_day(now.time()));

    let mut accepted = BTreeSet::new();
    for block in blocks {
        let (block_start, block_end) = block.minutes()?;
        let mut slot = block_start;
        loop {
            let slot_end = match slot.checked_add(service_duration) {
                Some(end) if end <= block_end => end,
                _ => break,
            };
            let free = !booked.iter().any(|b| b.overlaps(slot, slot_end));
            let upcoming = not_after.map_or(true, |cutoff| slot > cutoff);
            if free && upcoming {
                accepted.insert(slot);
            }
            match slot.checked_add(step) {
                Some(next) => slot = next,
                None => break,
            }
        }
    }

    Ok(accepted.into_iter().map(from_minutes).collect())
}
