//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{booking::CreateBooking, Booking, BookingStatus, DaySelection, ViewMode},
    services::{bookings::AgendaEntry, local_now},
    AppState,
};

/// Query parameters for agenda views
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AgendaQuery {
    /// View mode (day, week, history); defaults to day
    pub mode: Option<ViewMode>,
    /// Reference date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Only show this professional's bookings
    pub professional_id: Option<String>,
}

impl From<AgendaQuery> for DaySelection {
    fn from(query: AgendaQuery) -> Self {
        DaySelection {
            mode: query.mode.unwrap_or_default(),
            reference_date: query.date,
            professional_filter: query.professional_id,
        }
    }
}

/// Status change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// List bookings for a day, week or history view
#[utoipa::path(
    get,
    path = "/companies/{company_id}/bookings",
    tag = "bookings",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        AgendaQuery
    ),
    responses(
        (status = 200, description = "Agenda entries", body = Vec<AgendaEntry>)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<AgendaQuery>,
) -> AppResult<Json<Vec<AgendaEntry>>> {
    let selection = DaySelection::from(query);
    let entries = state
        .services
        .bookings
        .list_for_view(&company_id, &selection, local_now())
        .await?;
    Ok(Json(entries))
}

/// Book a free slot
#[utoipa::path(
    post,
    path = "/companies/{company_id}/bookings",
    tag = "bookings",
    params(("company_id" = String, Path, description = "Company ID")),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Professional has no working hours", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let booking = state
        .services
        .bookings
        .create_booking(&company_id, request, local_now())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Change a booking's status
#[utoipa::path(
    put,
    path = "/companies/{company_id}/bookings/{id}/status",
    tag = "bookings",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Transition not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state
        .services
        .bookings
        .update_status(&company_id, id, request.status)
        .await?;
    Ok(Json(booking))
}
