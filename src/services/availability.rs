//! Availability service: bookable slots, day closure and working hours

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{BookingFilter, BookingStatus, WorkingHours},
    repository::Repository,
    scheduling::{self, BookedInterval},
};

/// Whether a date had anyone working, and whether its business day is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayClosureStatus {
    pub has_schedule: bool,
    pub is_over: bool,
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
}

impl AvailabilityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Start times a professional can take a booking of `service_duration`
    /// minutes on `date`. A professional without working hours has none.
    pub async fn get_day_slots(
        &self,
        company_id: &str,
        professional_id: &str,
        date: NaiveDate,
        service_duration: u32,
        now: NaiveDateTime,
    ) -> AppResult<Vec<String>> {
        scheduling::check_service_duration(service_duration)?;

        let Some(hours) = self
            .repository
            .get_working_hours(company_id, professional_id)
            .await?
        else {
            tracing::debug!(company_id, professional_id, "No working hours configured");
            return Ok(Vec::new());
        };

        let booked = self.booked_intervals(company_id, professional_id, date).await?;
        scheduling::compute_available_slots(date, &hours, &booked, service_duration, now)
    }

    /// Intervals already taken by active bookings of a professional on `date`
    pub async fn booked_intervals(
        &self,
        company_id: &str,
        professional_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<BookedInterval>> {
        let filter = BookingFilter::on(date)
            .for_professional(professional_id)
            .with_statuses(&[BookingStatus::Active]);

        self.repository
            .list_bookings(company_id, &filter)
            .await?
            .iter()
            .map(BookedInterval::try_from)
            .collect()
    }

    pub async fn get_day_closure_status(
        &self,
        company_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> AppResult<DayClosureStatus> {
        let team = self.repository.list_working_hours(company_id).await?;
        let all_hours = || team.iter().map(|p| &p.hours);

        Ok(DayClosureStatus {
            has_schedule: scheduling::has_schedule_on_date(date, all_hours()),
            is_over: scheduling::is_day_over(date, all_hours(), now)?,
        })
    }

    // ---- Working hours ----

    pub async fn get_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
    ) -> AppResult<WorkingHours> {
        self.repository
            .get_working_hours(company_id, professional_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Working hours for professional {} not found",
                    professional_id
                ))
            })
    }

    pub async fn save_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
        hours: &WorkingHours,
    ) -> AppResult<()> {
        hours.validate()?;
        self.repository
            .save_working_hours(company_id, professional_id, hours)
            .await?;
        tracing::info!(company_id, professional_id, "Working hours updated");
        Ok(())
    }
}
