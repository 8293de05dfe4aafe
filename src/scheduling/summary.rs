//! Daily agenda insights

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::time::from_minutes;
use crate::models::{Booking, BookingStatus};

pub const DEFAULT_IDLE_GAP_THRESHOLD_MINUTES: u32 = 30;

/// A booking referenced from a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingMoment {
    pub booking_id: Uuid,
    pub time: String,
    pub client_name: String,
    pub service_name: String,
    pub professional_name: String,
}

impl From<&Booking> for BookingMoment {
    fn from(b: &Booking) -> Self {
        Self {
            booking_id: b.id,
            time: b.time.clone(),
            client_name: b.client_name.clone(),
            service_name: b.service_name.clone(),
            professional_name: b.professional_name.clone(),
        }
    }
}

/// Free time between two consecutive bookings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdleGap {
    pub from: String,
    pub until: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub no_show: usize,
    pub cancelled: usize,
    /// Sum of prices over completed bookings
    pub realized_revenue: Decimal,
    /// Sum of prices over every booking in the list
    pub projected_revenue: Decimal,
    pub first: Option<BookingMoment>,
    pub last: Option<BookingMoment>,
    pub largest_idle_gap: Option<IdleGap>,
    pub narrative: Vec<String>,
}

/// Summarize the bookings of one day.
///
/// Cancelled and no-show bookings are counted but do not occupy time, so
/// they take no part in first/last or idle-gap detection. Bookings whose
/// time cannot be read are likewise only counted.
pub fn summarize(bookings: &[Booking], idle_gap_threshold: u32) -> DailySummary {
    let count = |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count();

    let realized_revenue = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .map(|b| b.service_price)
        .sum();
    let projected_revenue = bookings.iter().map(|b| b.service_price).sum();

    let mut timeline: Vec<(u32, u32, &Booking)> = bookings
        .iter()
        .filter(|b| !b.status.is_cancelled() && b.status != BookingStatus::NoShow)
        .filter_map(|b| b.interval().ok().map(|(start, end)| (start, end, b)))
        .collect();
    timeline.sort_by_key(|(start, _, _)| *start);

    let mut summary = DailySummary {
        total: bookings.len(),
        completed: count(BookingStatus::Completed),
        pending: count(BookingStatus::Active),
        no_show: count(BookingStatus::NoShow),
        cancelled: bookings.iter().filter(|b| b.status.is_cancelled()).count(),
        realized_revenue,
        projected_revenue,
        first: timeline.first().map(|(_, _, b)| BookingMoment::from(*b)),
        last: timeline.last().map(|(_, _, b)| BookingMoment::from(*b)),
        largest_idle_gap: largest_idle_gap(&timeline, idle_gap_threshold),
        narrative: Vec::new(),
    };
    summary.narrative = narrate(&summary, idle_gap_threshold);
    summary
}

fn largest_idle_gap(timeline: &[(u32, u32, &Booking)], threshold: u32) -> Option<IdleGap> {
    let mut busy_until: Option<u32> = None;
    let mut best: Option<(u32, u32)> = None;

    for &(start, end, _) in timeline {
        if let Some(until) = busy_until {
            if start > until {
                let minutes = start - until;
                if minutes >= threshold && best.map_or(true, |(f, t)| minutes > t - f) {
                    best = Some((until, start));
                }
            }
        }
        busy_until = Some(busy_until.map_or(end, |u| u.max(end)));
    }

    best.map(|(from, until)| IdleGap {
        from: from_minutes(from),
        until: from_minutes(until),
        minutes: until - from,
    })
}

fn narrate(summary: &DailySummary, threshold: u32) -> Vec<String> {
    if summary.total == 0 {
        return vec!["• No appointments for this day".to_string()];
    }

    let mut lines = vec![format!(
        "• {} appointment{}: {} completed, {} pending",
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.completed,
        summary.pending
    )];
    if summary.no_show > 0 || summary.cancelled > 0 {
        lines.push(format!(
            "• {} no-show, {} cancelled",
            summary.no_show, summary.cancelled
        ));
    }
    lines.push(format!(
        "• Revenue: {:.2} realized of {:.2} projected",
        summary.realized_revenue, summary.projected_revenue
    ));
    if let Some(first) = &summary.first {
        lines.push(format!(
            "• First appointment at {} ({}, {})",
            first.time, first.client_name, first.service_name
        ));
    }
    if let Some(last) = &summary.last {
        lines.push(format!(
            "• Last appointment at {} ({}, {})",
            last.time, last.client_name, last.service_name
        ));
    }
    match &summary.largest_idle_gap {
        Some(gap) => lines.push(format!(
            "• Largest idle gap: {} to {} ({} min)",
            gap.from, gap.until, gap.minutes
        )),
        None => lines.push(format!("• No idle gap of {} min or more", threshold)),
    }
    lines
}
