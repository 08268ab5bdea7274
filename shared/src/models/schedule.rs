//! Sowing schedule models
//!
//! One schedule per 5-day sowing window. The nested tree is
//! groups -> varieties -> contributions; a variety's `total` is derived
//! from its contributions on every aggregation pass, while `completed` is
//! an externally tracked progress counter that aggregation must never
//! overwrite.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schedule lifecycle status, set manually by an administrator.
///
/// There are no automatic pending -> ongoing -> completed transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Pending,
    Ongoing,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Ongoing => "ongoing",
            ScheduleStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ScheduleStatus::Pending),
            "ongoing" => Some(ScheduleStatus::Ongoing),
            "completed" => Some(ScheduleStatus::Completed),
            _ => None,
        }
    }
}

/// A sowing schedule for one time window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub name: String,
    /// Inclusive, 00:00:00.000 on the first day of the window
    pub window_start: DateTime<Utc>,
    /// Inclusive, 23:59:59.999 on the last day of the window
    pub window_end: DateTime<Utc>,
    pub status: ScheduleStatus,
    /// Current-generation flag: true for schedules produced by the sowing
    /// aggregation engine, false for legacy rows
    pub sowing_derived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub groups: Vec<ScheduleGroup>,
}

/// A crop group entry within a schedule, identified by its group reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleGroup {
    pub id: Uuid,
    pub group_ref: Uuid,
    pub group_name: String,
    pub varieties: Vec<ScheduleVariety>,
}

/// A variety entry within a schedule group
///
/// Identified by variety reference when present, display name otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleVariety {
    pub id: Uuid,
    pub variety_ref: Option<Uuid>,
    pub variety_name: String,
    /// Derived: sum of contribution quantities, recomputed on every pass
    pub total: Decimal,
    /// Manually advanced progress counter; not clamped to `total`
    pub completed: Decimal,
    pub bookings: Vec<BookingContribution>,
}

impl ScheduleVariety {
    /// Presentation-layer remainder, never stored
    pub fn remaining(&self) -> Decimal {
        (self.total - self.completed).max(Decimal::ZERO)
    }
}

/// One booking's quantity committed toward a variety within a window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingContribution {
    pub booking_id: Uuid,
    pub farmer_id: Option<Uuid>,
    pub farmer_reg_no: Option<String>,
    pub quantity: Decimal,
    /// Cached for display only
    pub booking_date: Option<NaiveDate>,
    pub plot: Option<String>,
}

impl BookingContribution {
    /// At least one of farmer id / registration code must be present
    pub fn has_farmer_identity(&self) -> bool {
        self.farmer_id.is_some() || self.farmer_reg_no.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ScheduleStatus::Pending,
            ScheduleStatus::Ongoing,
            ScheduleStatus::Completed,
        ] {
            assert_eq!(ScheduleStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ScheduleStatus::parse("archived"), None);
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let variety = ScheduleVariety {
            id: Uuid::new_v4(),
            variety_ref: None,
            variety_name: "Marigold Local".to_string(),
            total: Decimal::from(100),
            completed: Decimal::from(130),
            bookings: vec![],
        };
        assert_eq!(variety.remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_contribution_needs_some_farmer_identity() {
        let contribution = BookingContribution {
            booking_id: Uuid::new_v4(),
            farmer_id: None,
            farmer_reg_no: Some("FRM-0042".to_string()),
            quantity: Decimal::from(10),
            booking_date: None,
            plot: None,
        };
        assert!(contribution.has_farmer_identity());

        let anonymous = BookingContribution {
            farmer_reg_no: None,
            ..contribution
        };
        assert!(!anonymous.has_farmer_identity());
    }

    #[test]
    fn test_remaining() {
        let variety = ScheduleVariety {
            id: Uuid::new_v4(),
            variety_ref: None,
            variety_name: "Marigold Local".to_string(),
            total: Decimal::from(100),
            completed: Decimal::from(30),
            bookings: vec![],
        };
        assert_eq!(variety.remaining(), Decimal::from(70));
    }
}
