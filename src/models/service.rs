//! Service catalog entries

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A service offered by a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub visible_in_storefront: bool,
}

/// Service data copied by value into a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServiceLine {
    #[validate(length(min = 1, message = "Service name is required"))]
    pub name: String,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Service duration must be between 1 minute and one day"
    ))]
    pub duration_minutes: u32,
    pub price: Decimal,
}

impl From<&Service> for ServiceLine {
    fn from(service: &Service) -> Self {
        Self {
            name: service.name.clone(),
            duration_minutes: service.duration_minutes,
            price: service.price,
        }
    }
}

/// Collapse several services into the name, duration and price stored on a
/// single booking. The duration saturates instead of overflowing; anything
/// a day is refused when the slot is checked.
pub fn combine(lines: &[ServiceLine]) -> (String, u32, Decimal) {
    let name = lines
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    let duration = lines
        .iter()
        .fold(0u32, |total, l| total.saturating_add(l.duration_minutes));
    let price = lines.iter().map(|l| l.price).sum();
    (name, duration, price)
}
