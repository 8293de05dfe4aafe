//! Agenda view selection

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{booking::BookingFilter, enums::ViewMode};

/// What slice of the agenda a view shows. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DaySelection {
    #[serde(default)]
    pub mode: ViewMode,
    pub reference_date: NaiveDate,
    pub professional_filter: Option<String>,
}

impl DaySelection {
    pub fn day(reference_date: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Day,
            reference_date,
            professional_filter: None,
        }
    }

    /// Sunday..Saturday week containing the reference date
    pub fn week_bounds(&self) -> (NaiveDate, NaiveDate) {
        let offset = self.reference_date.weekday().num_days_from_sunday();
        let start = self.reference_date - Duration::days(i64::from(offset));
        (start, start + Duration::days(6))
    }

    /// Repository filter covering this selection
    pub fn to_filter(&self) -> BookingFilter {
        let filter = match self.mode {
            ViewMode::Day => BookingFilter::on(self.reference_date),
            ViewMode::Week => {
                let (start, end) = self.week_bounds();
                BookingFilter::between(start, end)
            }
            ViewMode::History => BookingFilter::before(self.reference_date),
        };
        match &self.professional_filter {
            Some(professional_id) => filter.for_professional(professional_id.clone()),
            None => filter,
        }
    }
}
