//! Crop booking models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crop booking placed by a farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub booking_date: NaiveDate,
    /// Authoritative date for schedule bucketing
    pub sowing_date: NaiveDate,
    pub plot: Option<String>,
    /// Derived: sum of line totals
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub varieties: Vec<VarietyLine>,
}

/// One variety-line on a booking
///
/// The crop group is captured on the line, not only on the booking, so a
/// booking spanning groups stays historically accurate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarietyLine {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub variety_name: String,
    /// Catalog reference; may be absent when no catalog entry exists yet
    pub variety_ref: Option<Uuid>,
    pub crop_group_ref: Option<Uuid>,
    /// Free-text fallback when the group has no catalog row
    pub crop_group_name: Option<String>,
    pub quantity: Decimal,
    pub rate_per_unit: Decimal,
    /// Derived: quantity * rate_per_unit
    pub line_total: Decimal,
    pub position: i32,
}

impl VarietyLine {
    /// Derived line total
    pub fn compute_line_total(quantity: Decimal, rate_per_unit: Decimal) -> Decimal {
        quantity * rate_per_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let total =
            VarietyLine::compute_line_total(Decimal::from(200), Decimal::new(25, 1));
        assert_eq!(total, Decimal::new(5000, 1));
    }

    #[test]
    fn test_line_total_zero_quantity() {
        let total = VarietyLine::compute_line_total(Decimal::ZERO, Decimal::from(3));
        assert_eq!(total, Decimal::ZERO);
    }
}
