//! Availability and day-closing engine.
//!
//! Everything here is synchronous and free of I/O: callers load bookings and
//! working hours, sample `now` once, and pass them in.

pub mod closure;
pub mod slots;
pub mod summary;
pub mod time;

pub use closure::{has_appointment_expired, has_schedule_on_date, is_day_over, latest_shift_end};
pub use slots::{check_service_duration, compute_available_slots, BookedInterval};
pub use summary::{summarize, DailySummary};
