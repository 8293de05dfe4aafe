//! Professional working-hours template

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::Weekday;
use crate::{
    error::{AppError, AppResult},
    scheduling::time::{to_minutes, MINUTES_PER_DAY},
};

/// An open interval within a day, `start` inclusive, `end` exclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeBlock {
    /// Opening time (HH:MM)
    pub start: String,
    /// Closing time (HH:MM)
    pub end: String,
}

impl TimeBlock {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Block bounds in minutes since midnight
    pub fn minutes(&self) -> AppResult<(u32, u32)> {
        Ok((to_minutes(&self.start)?, to_minutes(&self.end)?))
    }
}

/// Schedule for one weekday
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub active: bool,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
    /// Overrides the professional-wide gap for this day when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_gap_minutes: Option<u32>,
}

impl DaySchedule {
    pub fn open(blocks: Vec<TimeBlock>) -> Self {
        Self {
            active: true,
            blocks,
            minimum_gap_minutes: None,
        }
    }
}

/// Weekly working-hours template of a professional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkingHours {
    #[serde(default)]
    pub days: BTreeMap<Weekday, DaySchedule>,
    /// Minimum gap between consecutive bookings, used when a day sets none
    #[serde(default)]
    pub minimum_gap_minutes: u32,
}

impl WorkingHours {
    pub fn with_day(mut self, weekday: Weekday, day: DaySchedule) -> Self {
        self.days.insert(weekday, day);
        self
    }

    pub fn with_gap(mut self, minutes: u32) -> Self {
        self.minimum_gap_minutes = minutes;
        self
    }

    /// Blocks the professional accepts bookings in on `weekday`.
    /// Empty when the day is missing or inactive.
    pub fn open_blocks(&self, weekday: Weekday) -> &[TimeBlock] {
        match self.days.get(&weekday) {
            Some(day) if day.active => &day.blocks,
            _ => &[],
        }
    }

    pub fn works_on(&self, weekday: Weekday) -> bool {
        !self.open_blocks(weekday).is_empty()
    }

    /// Effective minimum gap for `weekday`: a per-day value wins over the
    /// professional-wide one.
    pub fn gap_for(&self, weekday: Weekday) -> u32 {
        self.days
            .get(&weekday)
            .and_then(|day| day.minimum_gap_minutes)
            .unwrap_or(self.minimum_gap_minutes)
    }

    /// Latest block end on `weekday` in minutes, if the professional works
    pub fn shift_end(&self, weekday: Weekday) -> AppResult<Option<u32>> {
        let mut latest = None;
        for block in self.open_blocks(weekday) {
            let (_, end) = block.minutes()?;
            latest = latest.max(Some(end));
        }
        Ok(latest)
    }

    /// Check every block of every day, active or not, is well formed and no
    /// gap is longer than a day
    pub fn validate(&self) -> AppResult<()> {
        if self.minimum_gap_minutes > MINUTES_PER_DAY {
            return Err(AppError::Validation(format!(
                "Minimum gap must not exceed {} minutes",
                MINUTES_PER_DAY
            )));
        }
        for (weekday, day) in &self.days {
            if day.minimum_gap_minutes.is_some_and(|gap| gap > MINUTES_PER_DAY) {
                return Err(AppError::Validation(format!(
                    "Minimum gap on {} must not exceed {} minutes",
                    weekday, MINUTES_PER_DAY
                )));
            }
            for block in &day.blocks {
                let (start, end) = block.minutes()?;
                if start >= end {
                    return Err(AppError::Validation(format!(
                        "Block {}-{} on {} must start before it ends",
                        block.start, block.end, weekday
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Working hours of one professional within a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfessionalHours {
    pub professional_id: String,
    pub hours: WorkingHours,
}
