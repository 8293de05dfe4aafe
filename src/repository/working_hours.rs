//! Working-hours queries on the Postgres store

use sqlx::{types::Json, Row};

use super::PgRepository;
use crate::{
    error::AppResult,
    models::{ProfessionalHours, WorkingHours},
};

impl PgRepository {
    /// Get the working hours of one professional
    pub async fn working_hours_get(
        &self,
        company_id: &str,
        professional_id: &str,
    ) -> AppResult<Option<WorkingHours>> {
        let row: Option<Json<WorkingHours>> = sqlx::query_scalar(
            "SELECT schedule FROM working_hours WHERE company_id = $1 AND professional_id = $2",
        )
        .bind(company_id)
        .bind(professional_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(hours)| hours))
    }

    /// List working hours of every professional in a company
    pub async fn working_hours_list(&self, company_id: &str) -> AppResult<Vec<ProfessionalHours>> {
        let rows = sqlx::query(
            "SELECT professional_id, schedule FROM working_hours WHERE company_id = $1 ORDER BY professional_id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let Json(hours): Json<WorkingHours> = row.get("schedule");
                ProfessionalHours {
                    professional_id: row.get("professional_id"),
                    hours,
                }
            })
            .collect())
    }

    /// Create or replace the working hours of a professional
    pub async fn working_hours_save(
        &self,
        company_id: &str,
        professional_id: &str,
        hours: &WorkingHours,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO working_hours (company_id, professional_id, schedule, modif_date)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (company_id, professional_id)
            DO UPDATE SET schedule = EXCLUDED.schedule, modif_date = NOW()
            "#,
        )
        .bind(company_id)
        .bind(professional_id)
        .bind(Json(hours))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
