//! Daily insights for dashboards

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{Booking, BookingFilter},
    repository::Repository,
    scheduling::{summarize, DailySummary},
};

#[derive(Clone)]
pub struct InsightsService {
    repository: Repository,
    idle_gap_threshold: u32,
}

impl InsightsService {
    pub fn new(repository: Repository, idle_gap_threshold: u32) -> Self {
        Self {
            repository,
            idle_gap_threshold,
        }
    }

    /// Summary over a caller-supplied list of one day's bookings
    pub fn get_daily_summary(&self, bookings: &[Booking]) -> DailySummary {
        summarize(bookings, self.idle_gap_threshold)
    }

    /// Summary over every booking stored for `date`, whatever its status
    pub async fn summary_for_date(&self, company_id: &str, date: NaiveDate) -> AppResult<DailySummary> {
        let bookings = self
            .repository
            .list_bookings(company_id, &BookingFilter::on(date))
            .await?;
        Ok(self.get_daily_summary(&bookings))
    }
}
