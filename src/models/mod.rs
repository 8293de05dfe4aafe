//! Data models for Agenda

pub mod booking;
pub mod enums;
pub mod selection;
pub mod service;
pub mod working_hours;

// Re-export commonly used types
pub use booking::{Booking, BookingFilter, NewBooking};
pub use enums::{BookingStatus, ViewMode, Weekday};
pub use selection::DaySelection;
pub use service::{Service, ServiceLine};
pub use working_hours::{DaySchedule, ProfessionalHours, TimeBlock, WorkingHours};
