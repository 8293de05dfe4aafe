//! Business logic services

pub mod availability;
pub mod bookings;
pub mod insights;
pub mod reconciliation;

use chrono::{Duration, Local, NaiveDateTime};

use crate::{config::SchedulingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub availability: availability::AvailabilityService,
    pub bookings: bookings::BookingsService,
    pub reconciliation: reconciliation::ReconciliationService,
    pub insights: insights::InsightsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, scheduling: SchedulingConfig) -> Self {
        let availability = availability::AvailabilityService::new(repository.clone());
        Self {
            bookings: bookings::BookingsService::new(repository.clone(), availability.clone()),
            reconciliation: reconciliation::ReconciliationService::new(
                repository.clone(),
                Duration::minutes(i64::from(scheduling.session_ttl_minutes)),
            ),
            insights: insights::InsightsService::new(repository, scheduling.idle_gap_threshold_minutes),
            availability,
        }
    }
}

/// Wall-clock time in the server's local time zone, sampled once per request
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
