//! Holding lot ("stabulation") models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::animal::AnimalType;

/// A group of live animals held at a facility pending slaughter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingLot {
    pub id: i64,
    /// Generated lot number (e.g., "STB-2026-0001")
    pub lot_number: String,
    pub facility_id: i64,
    pub animal_type: AnimalType,
    pub status: StabulationStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Ordered member animal ids
    pub animal_ids: Vec<i64>,
    pub max_capacity: i32,
    pub cancellation_reason: Option<String>,
    pub finalized_by: Option<Uuid>,
    pub cancelled_by: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a holding lot; Finalized and Cancelled are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabulationStatus {
    Active,
    Finalized,
    Cancelled,
}

impl StabulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StabulationStatus::Active => "active",
            StabulationStatus::Finalized => "finalized",
            StabulationStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StabulationStatus::Active),
            "finalized" => Some(StabulationStatus::Finalized),
            "cancelled" => Some(StabulationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(self, target: StabulationStatus) -> bool {
        matches!(
            (self, target),
            (StabulationStatus::Active, StabulationStatus::Finalized)
                | (StabulationStatus::Active, StabulationStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, StabulationStatus::Active)
    }
}

impl std::fmt::Display for StabulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StabulationStatus::Active => write!(f, "Active"),
            StabulationStatus::Finalized => write!(f, "Finalized"),
            StabulationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Per-animal data submitted when a holding lot is finalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeEntry {
    pub animal_id: i64,
    pub hot_weight_kg: Decimal,
    pub slaughter_tag_number: String,
}

/// Generate a lot number
pub fn generate_lot_number(year: i32, sequence: i32) -> String {
    format!("STB-{}-{:04}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(StabulationStatus::Active.can_transition_to(StabulationStatus::Finalized));
        assert!(StabulationStatus::Active.can_transition_to(StabulationStatus::Cancelled));
        assert!(!StabulationStatus::Finalized.can_transition_to(StabulationStatus::Cancelled));
        assert!(!StabulationStatus::Cancelled.can_transition_to(StabulationStatus::Finalized));
        assert!(!StabulationStatus::Finalized.can_transition_to(StabulationStatus::Active));
    }

    #[test]
    fn test_lot_number_format() {
        assert_eq!(generate_lot_number(2026, 12), "STB-2026-0012");
    }
}
