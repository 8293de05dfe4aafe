//! API handlers for Agenda REST endpoints

pub mod availability;
pub mod bookings;
pub mod health;
pub mod openapi;
pub mod reconciliation;
pub mod summary;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Availability
        .route(
            "/companies/:company_id/professionals/:professional_id/slots",
            get(availability::get_day_slots),
        )
        .route(
            "/companies/:company_id/professionals/:professional_id/working-hours",
            get(availability::get_working_hours).put(availability::save_working_hours),
        )
        .route(
            "/companies/:company_id/closure-status",
            get(availability::get_day_closure_status),
        )
        // Bookings
        .route("/companies/:company_id/bookings", get(bookings::list_bookings))
        .route("/companies/:company_id/bookings", post(bookings::create_booking))
        .route(
            "/companies/:company_id/bookings/:id/status",
            put(bookings::update_booking_status),
        )
        // Summary
        .route("/companies/:company_id/summary", get(summary::get_summary))
        .route("/companies/:company_id/summary", post(summary::summarize_bookings))
        // Reconciliation
        .route(
            "/companies/:company_id/reconciliation",
            post(reconciliation::start_reconciliation),
        )
        .route(
            "/reconciliation/:session_id/bookings/:booking_id/no-show",
            post(reconciliation::mark_no_show),
        )
        .route(
            "/reconciliation/:session_id/finalize",
            post(reconciliation::finalize_day),
        )
        .route(
            "/reconciliation/:session_id",
            delete(reconciliation::dismiss_reconciliation),
        )
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
