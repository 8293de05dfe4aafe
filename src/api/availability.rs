//! Availability endpoints: slots, day closure and working hours

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::WorkingHours,
    services::{availability::DayClosureStatus, local_now},
    AppState,
};

/// Query parameters for slot lookup
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SlotsQuery {
    /// Date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Total service duration in minutes
    pub duration: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub professional_id: String,
    /// Free start times (HH:MM), ascending
    pub slots: Vec<String>,
}

/// Query parameters for day closure status
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ClosureQuery {
    /// Date (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Bookable start times of a professional on a date
#[utoipa::path(
    get,
    path = "/companies/{company_id}/professionals/{professional_id}/slots",
    tag = "availability",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("professional_id" = String, Path, description = "Professional ID"),
        SlotsQuery
    ),
    responses(
        (status = 200, description = "Available slots", body = SlotsResponse),
        (status = 400, description = "Invalid duration", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_day_slots(
    State(state): State<AppState>,
    Path((company_id, professional_id)): Path<(String, String)>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<SlotsResponse>> {
    let slots = state
        .services
        .availability
        .get_day_slots(&company_id, &professional_id, query.date, query.duration, local_now())
        .await?;

    Ok(Json(SlotsResponse {
        date: query.date,
        professional_id,
        slots,
    }))
}

/// Whether a date had a schedule and whether its business day is over
#[utoipa::path(
    get,
    path = "/companies/{company_id}/closure-status",
    tag = "availability",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ClosureQuery
    ),
    responses(
        (status = 200, description = "Day closure status", body = DayClosureStatus)
    )
)]
pub async fn get_day_closure_status(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ClosureQuery>,
) -> AppResult<Json<DayClosureStatus>> {
    let status = state
        .services
        .availability
        .get_day_closure_status(&company_id, query.date, local_now())
        .await?;
    Ok(Json(status))
}

// ---- Working hours ----

/// Get a professional's weekly working hours
#[utoipa::path(
    get,
    path = "/companies/{company_id}/professionals/{professional_id}/working-hours",
    tag = "availability",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("professional_id" = String, Path, description = "Professional ID")
    ),
    responses(
        (status = 200, description = "Working hours", body = WorkingHours),
        (status = 404, description = "No working hours configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_working_hours(
    State(state): State<AppState>,
    Path((company_id, professional_id)): Path<(String, String)>,
) -> AppResult<Json<WorkingHours>> {
    let hours = state
        .services
        .availability
        .get_working_hours(&company_id, &professional_id)
        .await?;
    Ok(Json(hours))
}

/// Replace a professional's weekly working hours
#[utoipa::path(
    put,
    path = "/companies/{company_id}/professionals/{professional_id}/working-hours",
    tag = "availability",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("professional_id" = String, Path, description = "Professional ID")
    ),
    request_body = WorkingHours,
    responses(
        (status = 200, description = "Working hours saved", body = WorkingHours),
        (status = 400, description = "Invalid time blocks", body = crate::error::ErrorResponse)
    )
)]
pub async fn save_working_hours(
    State(state): State<AppState>,
    Path((company_id, professional_id)): Path<(String, String)>,
    Json(hours): Json<WorkingHours>,
) -> AppResult<Json<WorkingHours>> {
    state
        .services
        .availability
        .save_working_hours(&company_id, &professional_id, &hours)
        .await?;
    Ok(Json(hours))
}
