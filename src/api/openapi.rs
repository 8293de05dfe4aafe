//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, bookings, health, reconciliation, summary};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agenda API",
        version = "1.0.0",
        description = "Appointment availability and day-closing REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::get_day_slots,
        availability::get_day_closure_status,
        availability::get_working_hours,
        availability::save_working_hours,
        // Bookings
        bookings::list_bookings,
        bookings::create_booking,
        bookings::update_booking_status,
        // Summary
        summary::get_summary,
        summary::summarize_bookings,
        // Reconciliation
        reconciliation::start_reconciliation,
        reconciliation::mark_no_show,
        reconciliation::finalize_day,
        reconciliation::dismiss_reconciliation,
    ),
    components(
        schemas(
            // Availability
            availability::SlotsQuery,
            availability::SlotsResponse,
            availability::ClosureQuery,
            crate::services::availability::DayClosureStatus,
            crate::models::WorkingHours,
            crate::models::DaySchedule,
            crate::models::TimeBlock,
            crate::models::Weekday,
            // Bookings
            bookings::AgendaQuery,
            bookings::UpdateStatusRequest,
            crate::models::Booking,
            crate::models::BookingStatus,
            crate::models::ViewMode,
            crate::models::ServiceLine,
            crate::models::booking::CreateBooking,
            crate::services::bookings::AgendaEntry,
            // Summary
            summary::SummaryQuery,
            crate::scheduling::DailySummary,
            crate::scheduling::summary::BookingMoment,
            crate::scheduling::summary::IdleGap,
            // Reconciliation
            crate::services::reconciliation::PendingDay,
            crate::services::reconciliation::ReconciliationStart,
            crate::services::reconciliation::FinalizeReport,
            crate::services::reconciliation::FinalizeOutcome,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Bookable slots, day closure and working hours"),
        (name = "bookings", description = "Booking management"),
        (name = "summary", description = "Daily insights"),
        (name = "reconciliation", description = "Day-closing reconciliation")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
