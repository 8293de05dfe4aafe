//! In-process store, used for `storage.backend = "memory"` and in tests

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BookingRepository;
use crate::{
    error::{AppError, AppResult},
    models::{Booking, BookingFilter, BookingStatus, NewBooking, ProfessionalHours, WorkingHours},
};

#[derive(Default)]
struct Store {
    /// Bookings per company
    bookings: HashMap<String, Vec<Booking>>,
    /// Working hours per company, keyed by professional
    working_hours: HashMap<String, BTreeMap<String, WorkingHours>>,
}

#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a booking as-is, keeping its id and status
    pub async fn insert_booking(&self, booking: Booking) {
        let mut store = self.store.write().await;
        store
            .bookings
            .entry(booking.company_id.clone())
            .or_default()
            .push(booking);
    }
}

#[async_trait]
impl BookingRepository for MemoryRepository {
    async fn list_bookings(&self, company_id: &str, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        let store = self.store.read().await;
        let mut bookings: Vec<Booking> = store
            .bookings
            .get(company_id)
            .map(|all| all.iter().filter(|b| filter.matches(b)).cloned().collect())
            .unwrap_or_default();
        bookings.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        Ok(bookings)
    }

    async fn get_booking(&self, company_id: &str, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let store = self.store.read().await;
        Ok(store
            .bookings
            .get(company_id)
            .and_then(|all| all.iter().find(|b| b.id == booking_id))
            .cloned())
    }

    async fn create_booking(&self, company_id: &str, booking: &NewBooking) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let booking = booking.clone().into_booking(company_id, id, Utc::now());
        self.insert_booking(booking).await;
        Ok(id)
    }

    async fn update_booking_status(
        &self,
        company_id: &str,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> AppResult<()> {
        let mut store = self.store.write().await;
        let booking = store
            .bookings
            .get_mut(company_id)
            .and_then(|all| all.iter_mut().find(|b| b.id == booking_id))
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;
        booking.status = status;
        Ok(())
    }

    async fn get_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
    ) -> AppResult<Option<WorkingHours>> {
        let store = self.store.read().await;
        Ok(store
            .working_hours
            .get(company_id)
            .and_then(|by_pro| by_pro.get(professional_id))
            .cloned())
    }

    async fn list_working_hours(&self, company_id: &str) -> AppResult<Vec<ProfessionalHours>> {
        let store = self.store.read().await;
        Ok(store
            .working_hours
            .get(company_id)
            .map(|by_pro| {
                by_pro
                    .iter()
                    .map(|(professional_id, hours)| ProfessionalHours {
                        professional_id: professional_id.clone(),
                        hours: hours.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_working_hours(
        &self,
        company_id: &str,
        professional_id: &str,
        hours: &WorkingHours,
    ) -> AppResult<()> {
        let mut store = self.store.write().await;
        store
            .working_hours
            .entry(company_id.to_string())
            .or_default()
            .insert(professional_id.to_string(), hours.clone());
        Ok(())
    }
}
