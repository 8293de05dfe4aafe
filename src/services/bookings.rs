//! Booking management service

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::availability::AvailabilityService;
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::CreateBooking, service, Booking, BookingStatus, DaySelection, NewBooking,
        ViewMode,
    },
    repository::{BookingRepository, Repository},
    scheduling::{
        check_service_duration, compute_available_slots, has_appointment_expired,
        time::{from_minutes, to_minutes, weekday_of},
    },
};

/// A booking as shown in an agenda view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgendaEntry {
    #[serde(flatten)]
    pub booking: Booking,
    /// Whether the booking's shift (or, without working hours, its start) is behind us
    pub expired: bool,
}

/// Move a booking to `status`, enforcing the transition table.
///
/// Re-applying the status a terminal booking already has is a no-op, so a
/// write that may or may not have landed can be retried by hand.
pub async fn apply_status(
    repository: &dyn BookingRepository,
    company_id: &str,
    booking_id: Uuid,
    status: BookingStatus,
) -> AppResult<Booking> {
    let mut booking = repository
        .get_booking(company_id, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    if booking.status == status && status.is_terminal() {
        return Ok(booking);
    }
    if !booking.status.can_transition_to(status) {
        return Err(AppError::BusinessRule(format!(
            "Booking {} cannot move from {} to {}",
            booking_id, booking.status, status
        )));
    }

    repository
        .update_booking_status(company_id, booking_id, status)
        .await?;
    tracing::info!(company_id, %booking_id, from = %booking.status, to = %status, "Booking status changed");

    booking.status = status;
    Ok(booking)
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    availability: AvailabilityService,
}

impl BookingsService {
    pub fn new(repository: Repository, availability: AvailabilityService) -> Self {
        Self { repository, availability }
    }

    /// Create an active booking at one of the professional's free slots
    pub async fn create_booking(
        &self,
        company_id: &str,
        request: CreateBooking,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        request.validate()?;
        let time = from_minutes(to_minutes(&request.time)?);
        if request.date < now.date() {
            return Err(AppError::Validation(format!(
                "Cannot book on {}, which is in the past",
                request.date
            )));
        }

        let (service_name, service_duration, service_price) = service::combine(&request.services);
        check_service_duration(service_duration)?;

        let hours = self
            .availability
            .get_working_hours(company_id, &request.professional_id)
            .await?;
        let booked = self
            .availability
            .booked_intervals(company_id, &request.professional_id, request.date)
            .await?;

        // Advisory check: the store offers no range lock, so two concurrent
        // requests may both pass it.
        let slots = compute_available_slots(request.date, &hours, &booked, service_duration, now)?;
        if !slots.contains(&time) {
            return Err(AppError::Conflict(format!(
                "{} on {} is not available for {} minutes with {}",
                time, request.date, service_duration, request.professional_name
            )));
        }

        let new_booking = NewBooking {
            professional_id: request.professional_id,
            professional_name: request.professional_name,
            client_id: request.client_id,
            client_name: request.client_name,
            service_name,
            service_duration,
            service_price,
            date: request.date,
            time,
        };
        let id = self.repository.create_booking(company_id, &new_booking).await?;
        tracing::info!(company_id, booking_id = %id, date = %new_booking.date, time = %new_booking.time, "Booking created");

        self.repository
            .get_booking(company_id, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Booking {} vanished after insert", id)))
    }

    pub async fn update_status(
        &self,
        company_id: &str,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        apply_status(self.repository.as_ref(), company_id, booking_id, status).await
    }

    /// Bookings for a day, week or history view, each flagged as expired or not
    pub async fn list_for_view(
        &self,
        company_id: &str,
        selection: &DaySelection,
        now: NaiveDateTime,
    ) -> AppResult<Vec<AgendaEntry>> {
        let mut bookings = self
            .repository
            .list_bookings(company_id, &selection.to_filter())
            .await?;
        if selection.mode == ViewMode::History {
            bookings.reverse();
        }

        let team: HashMap<String, _> = self
            .repository
            .list_working_hours(company_id)
            .await?
            .into_iter()
            .map(|p| (p.professional_id, p.hours))
            .collect();

        bookings
            .into_iter()
            .map(|booking| -> AppResult<AgendaEntry> {
                let shift_end = match team.get(&booking.professional_id) {
                    Some(hours) => hours.shift_end(weekday_of(booking.date))?.map(from_minutes),
                    None => None,
                };
                let expired = has_appointment_expired(
                    booking.date,
                    &booking.time,
                    shift_end.as_deref(),
                    now,
                )?;
                Ok(AgendaEntry { booking, expired })
            })
            .collect()
    }
}
