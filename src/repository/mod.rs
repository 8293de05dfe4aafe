//! Repository layer: the booking store boundary

pub mod bookings;
pub mod memory;
pub mod working_hours;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Booking, BookingFilter, BookingStatus, NewBooking, ProfessionalHours, WorkingHours},
};

pub use memory::MemoryRepository;

/// Booking and working-hours store, scoped per company
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Bookings matching `filter`, ordered by date then time
    async fn list_bookings(&self, company_id: &str, filter: &BookingFilter) -> AppResult<Vec<Booking>>;

    async fn get_booking(&self, company_id: &str, booking_id: Uuid) -> AppResult<Option<Booking>>;

    /// Insert an `active` booking and return its id
    async fn create_booking(&self, company_id: &str, booking: &NewBooking) -> AppResult<Uuid>;

    /// Fails with `NotFound` when the booking no longer exists
    async fn update_booking_status(
        &self,
        company_id: &str,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> AppResult<()>;

    async fn get_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
    ) -> AppResult<Option<WorkingHours>>;

    /// Working hours of every professional of the company
    async fn list_working_hours(&self, company_id: &str) -> AppResult<Vec<ProfessionalHours>>;

    async fn save_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
        hours: &WorkingHours,
    ) -> AppResult<()>;
}

/// Shared handle to the configured store
pub type Repository = Arc<dyn BookingRepository>;

/// Postgres-backed store
#[derive(Clone)]
pub struct PgRepository {
    pub pool: Pool<Postgres>,
}

impl PgRepository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgRepository {
    async fn list_bookings(&self, company_id: &str, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        self.bookings_list(company_id, filter).await
    }

    async fn get_booking(&self, company_id: &str, booking_id: Uuid) -> AppResult<Option<Booking>> {
        self.bookings_get(company_id, booking_id).await
    }

    async fn create_booking(&self, company_id: &str, booking: &NewBooking) -> AppResult<Uuid> {
        self.bookings_create(company_id, booking).await
    }

    async fn update_booking_status(
        &self,
        company_id: &str,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> AppResult<()> {
        self.bookings_update_status(company_id, booking_id, status).await
    }

    async fn get_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
    ) -> AppResult<Option<WorkingHours>> {
        self.working_hours_get(company_id, professional_id).await
    }

    async fn list_working_hours(&self, company_id: &str) -> AppResult<Vec<ProfessionalHours>> {
        self.working_hours_list(company_id).await
    }

    async fn save_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
        hours: &WorkingHours,
    ) -> AppResult<()> {
        self.working_hours_save(company_id, professional_id, hours).await
    }
}
