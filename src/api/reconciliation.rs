//! Day-closing reconciliation endpoints.
//!
//! A session is opened on start when a past day needs closing; every reply
//! carries the next pending day, or none once the backlog is clear.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::{
        local_now,
        reconciliation::{FinalizeOutcome, PendingDay, ReconciliationStart},
    },
    AppState,
};

/// Start reconciling a company's past days
#[utoipa::path(
    post,
    path = "/companies/{company_id}/reconciliation",
    tag = "reconciliation",
    params(("company_id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "First pending day, if any", body = ReconciliationStart),
        (status = 409, description = "A session is already open for this company", body = crate::error::ErrorResponse)
    )
)]
pub async fn start_reconciliation(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> AppResult<Json<ReconciliationStart>> {
    let start = state
        .services
        .reconciliation
        .start(&company_id, local_now())
        .await?;
    Ok(Json(start))
}

/// Mark a pending booking as a no-show
#[utoipa::path(
    post,
    path = "/reconciliation/{session_id}/bookings/{booking_id}/no-show",
    tag = "reconciliation",
    params(
        ("session_id" = Uuid, Path, description = "Reconciliation session ID"),
        ("booking_id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Remaining pending bookings", body = PendingDay),
        (status = 404, description = "Session not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Session busy", body = crate::error::ErrorResponse),
        (status = 422, description = "Booking not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_no_show(
    State(state): State<AppState>,
    Path((session_id, booking_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<PendingDay>> {
    let day = state
        .services
        .reconciliation
        .mark_no_show(session_id, booking_id, local_now())
        .await?;
    Ok(Json(day))
}

/// Complete the remaining bookings of the pending day and move to the next
#[utoipa::path(
    post,
    path = "/reconciliation/{session_id}/finalize",
    tag = "reconciliation",
    params(("session_id" = Uuid, Path, description = "Reconciliation session ID")),
    responses(
        (status = 200, description = "Finalize report and next pending day", body = FinalizeOutcome),
        (status = 404, description = "Session not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Session busy", body = crate::error::ErrorResponse)
    )
)]
pub async fn finalize_day(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<FinalizeOutcome>> {
    let outcome = state
        .services
        .reconciliation
        .finalize(session_id, local_now())
        .await?;
    Ok(Json(outcome))
}

/// Dismiss the session without changing any booking
#[utoipa::path(
    delete,
    path = "/reconciliation/{session_id}",
    tag = "reconciliation",
    params(("session_id" = Uuid, Path, description = "Reconciliation session ID")),
    responses(
        (status = 204, description = "Session dismissed"),
        (status = 404, description = "Session not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn dismiss_reconciliation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.reconciliation.dismiss(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
