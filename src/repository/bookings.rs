//! Bookings queries on the Postgres store

use chrono::Utc;
use uuid::Uuid;

use super::PgRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::BookingRow, Booking, BookingFilter, BookingStatus, NewBooking,
    },
};

impl PgRepository {
    /// List bookings of a company, ordered by date and time
    pub async fn bookings_list(&self, company_id: &str, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        let mut conditions = vec!["company_id = $1".to_string()];
        let mut idx = 2;

        if filter.date.is_some() {
            conditions.push(format!("date = ${}", idx));
            idx += 1;
        }
        if filter.date_from.is_some() {
            conditions.push(format!("date >= ${}", idx));
            idx += 1;
        }
        if filter.date_to.is_some() {
            conditions.push(format!("date <= ${}", idx));
            idx += 1;
        }
        if filter.professional_id.is_some() {
            conditions.push(format!("professional_id = ${}", idx));
            idx += 1;
        }
        if filter.status_in.is_some() {
            conditions.push(format!("status = ANY(${})", idx));
        }

        let query = format!(
            "SELECT * FROM bookings WHERE {} ORDER BY date, time",
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, BookingRow>(&query).bind(company_id);
        if let Some(date) = filter.date { builder = builder.bind(date); }
        if let Some(from) = filter.date_from { builder = builder.bind(from); }
        if let Some(to) = filter.date_to { builder = builder.bind(to); }
        if let Some(ref professional_id) = filter.professional_id { builder = builder.bind(professional_id); }
        if let Some(ref statuses) = filter.status_in {
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            builder = builder.bind(statuses);
        }

        builder
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    /// Get a booking by ID
    pub async fn bookings_get(&self, company_id: &str, id: Uuid) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Booking::try_from)
            .transpose()
    }

    /// Insert an active booking
    pub async fn bookings_create(&self, company_id: &str, data: &NewBooking) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let duration = i32::try_from(data.service_duration)
            .map_err(|_| AppError::Validation("Service duration is too large".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, company_id, professional_id, professional_name, client_id, client_name,
                service_name, service_duration, service_price, date, time, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(&data.professional_id)
        .bind(&data.professional_name)
        .bind(&data.client_id)
        .bind(&data.client_name)
        .bind(&data.service_name)
        .bind(duration)
        .bind(data.service_price)
        .bind(data.date)
        .bind(&data.time)
        .bind(BookingStatus::Active.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Set the status of a booking
    pub async fn bookings_update_status(
        &self,
        company_id: &str,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE company_id = $2 AND id = $3")
            .bind(status.as_str())
            .bind(company_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }
        Ok(())
    }
}
