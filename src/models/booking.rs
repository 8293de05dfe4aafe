//! Booking (appointment) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{enums::BookingStatus, service::ServiceLine};
use crate::{
    error::{AppError, AppResult},
    scheduling::time::to_minutes,
};

/// A client appointment with a professional.
///
/// Service name, duration and price are copied in at creation time so later
/// edits to the service catalog do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub company_id: String,
    pub professional_id: String,
    pub professional_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub service_name: String,
    /// Duration in minutes
    pub service_duration: u32,
    pub service_price: Decimal,
    pub date: NaiveDate,
    /// Start time (HH:MM)
    pub time: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Occupied half-open interval `[start, end)` in minutes since midnight.
    /// The end may run past midnight and saturates at `u32::MAX`.
    pub fn interval(&self) -> AppResult<(u32, u32)> {
        let start = to_minutes(&self.time)?;
        Ok((start, start.saturating_add(self.service_duration)))
    }
}

/// Booking row as stored in the database
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub company_id: String,
    pub professional_id: String,
    pub professional_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub service_name: String,
    pub service_duration: i32,
    pub service_price: Decimal,
    pub date: NaiveDate,
    pub time: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let service_duration = u32::try_from(row.service_duration).map_err(|_| {
            AppError::Internal(format!(
                "Booking {} has negative duration {}",
                row.id, row.service_duration
            ))
        })?;

        Ok(Booking {
            id: row.id,
            company_id: row.company_id,
            professional_id: row.professional_id,
            professional_name: row.professional_name,
            client_id: row.client_id,
            client_name: row.client_name,
            service_name: row.service_name,
            service_duration,
            service_price: row.service_price,
            date: row.date,
            time: row.time,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Booking data accepted by the repository; id, status and creation date are
/// assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub professional_id: String,
    pub professional_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub service_name: String,
    pub service_duration: u32,
    pub service_price: Decimal,
    pub date: NaiveDate,
    pub time: String,
}

impl NewBooking {
    pub fn into_booking(self, company_id: &str, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            company_id: company_id.to_string(),
            professional_id: self.professional_id,
            professional_name: self.professional_name,
            client_id: self.client_id,
            client_name: self.client_name,
            service_name: self.service_name,
            service_duration: self.service_duration,
            service_price: self.service_price,
            date: self.date,
            time: self.time,
            status: BookingStatus::Active,
            created_at,
        }
    }
}

/// Create booking request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    #[validate(length(min = 1, message = "Professional is required"))]
    pub professional_id: String,
    #[validate(length(min = 1, message = "Professional name is required"))]
    pub professional_name: String,
    pub client_id: Option<String>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    /// Services booked together, performed back to back
    #[validate(length(min = 1, message = "At least one service is required"), nested)]
    pub services: Vec<ServiceLine>,
    /// Date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Start time (HH:MM)
    pub time: String,
}

/// Query filter for listing bookings within a company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub date_to: Option<NaiveDate>,
    pub professional_id: Option<String>,
    pub status_in: Option<Vec<BookingStatus>>,
}

impl BookingFilter {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            ..Self::default()
        }
    }

    pub fn before(date: NaiveDate) -> Self {
        Self {
            date_to: date.pred_opt(),
            ..Self::default()
        }
    }

    pub fn for_professional(mut self, professional_id: impl Into<String>) -> Self {
        self.professional_id = Some(professional_id.into());
        self
    }

    pub fn with_statuses(mut self, statuses: &[BookingStatus]) -> Self {
        self.status_in = Some(statuses.to_vec());
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.date.map_or(true, |d| booking.date == d)
            && self.date_from.map_or(true, |d| booking.date >= d)
            && self.date_to.map_or(true, |d| booking.date <= d)
            && self
                .professional_id
                .as_ref()
                .map_or(true, |p| &booking.professional_id == p)
            && self
                .status_in
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&booking.status))
    }
}
