//! Daily summary endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, models::Booking, scheduling::DailySummary, AppState};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    /// Date (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Summary of the bookings stored for a date
#[utoipa::path(
    get,
    path = "/companies/{company_id}/summary",
    tag = "summary",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        SummaryQuery
    ),
    responses(
        (status = 200, description = "Daily summary", body = DailySummary)
    )
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<DailySummary>> {
    let summary = state
        .services
        .insights
        .summary_for_date(&company_id, query.date)
        .await?;
    Ok(Json(summary))
}

/// Summary of a posted list of one day's bookings
#[utoipa::path(
    post,
    path = "/companies/{company_id}/summary",
    tag = "summary",
    params(("company_id" = String, Path, description = "Company ID")),
    request_body = Vec<Booking>,
    responses(
        (status = 200, description = "Daily summary", body = DailySummary)
    )
)]
pub async fn summarize_bookings(
    State(state): State<AppState>,
    Path(_company_id): Path<String>,
    Json(bookings): Json<Vec<Booking>>,
) -> Json<DailySummary> {
    Json(state.services.insights.get_daily_summary(&bookings))
}
