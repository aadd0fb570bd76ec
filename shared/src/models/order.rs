//! Purchase order ("bon de commande") models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::animal::AnimalType;

/// A purchase order for animals or meat product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: i64,
    /// Unique order number (e.g., "BC-2026-0001"), immutable once assigned
    pub order_number: String,
    pub quantity_type: QuantityType,
    pub quantity: Decimal,
    pub animal_type: AnimalType,
    pub product_type: ProductType,
    pub includes_offal: bool,
    pub source: OrderSource,
    pub slaughterhouse_id: i64,
    pub client_id: i64,
    pub notes: Option<String>,
    pub deposit: Option<Decimal>,
    pub planned_delivery_date: Option<NaiveDate>,
    /// Set only when the order reaches Delivered
    pub actual_delivery_date: Option<NaiveDate>,
    pub status: OrderStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    InProgress,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(OrderStatus::Draft),
            "confirmed" => Some(OrderStatus::Confirmed),
            "in_progress" => Some(OrderStatus::InProgress),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the directed status graph permits moving to `target`.
    ///
    /// Draft -> Confirmed -> InProgress -> Delivered, with Cancelled
    /// reachable from any non-terminal status.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Draft, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Delivered)
                | (Draft, Cancelled)
                | (Confirmed, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    /// An order is editable before it starts execution.
    pub fn is_editable(self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Confirmed)
    }

    /// Only draft orders may be physically deleted.
    pub fn is_deletable(self) -> bool {
        matches!(self, OrderStatus::Draft)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Draft => write!(f, "Draft"),
            OrderStatus::Confirmed => write!(f, "Confirmed"),
            OrderStatus::InProgress => write!(f, "In Progress"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// How the ordered quantity is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityType {
    ByCount,
    ByWeight,
}

impl QuantityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::ByCount => "by_count",
            QuantityType::ByWeight => "by_weight",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "by_count" => Some(QuantityType::ByCount),
            "by_weight" => Some(QuantityType::ByWeight),
            _ => None,
        }
    }
}

/// Product delivered by the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Carcass,
    Live,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Carcass => "carcass",
            ProductType::Live => "live",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "carcass" => Some(ProductType::Carcass),
            "live" => Some(ProductType::Live),
            _ => None,
        }
    }
}

/// Which side of the operation fulfils the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    Production,
    Slaughterhouse,
}

impl OrderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSource::Production => "production",
            OrderSource::Slaughterhouse => "slaughterhouse",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "production" => Some(OrderSource::Production),
            "slaughterhouse" => Some(OrderSource::Slaughterhouse),
            _ => None,
        }
    }
}

/// Generate an order number
pub fn generate_order_number(year: i32, sequence: i32) -> String {
    format!("BC-{}-{:04}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path_transitions() {
        assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::InProgress));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_cancellation_reachability() {
        assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Draft));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::InProgress));
    }

    #[test]
    fn test_editability() {
        assert!(OrderStatus::Draft.is_editable());
        assert!(OrderStatus::Confirmed.is_editable());
        assert!(!OrderStatus::InProgress.is_editable());
        assert!(!OrderStatus::Delivered.is_editable());
        assert!(!OrderStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_deletability() {
        assert!(OrderStatus::Draft.is_deletable());
        assert!(!OrderStatus::Confirmed.is_deletable());
        assert!(!OrderStatus::Cancelled.is_deletable());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("unknown"), None);
    }

    #[test]
    fn test_order_number_format() {
        assert_eq!(generate_order_number(2026, 1), "BC-2026-0001");
        assert_eq!(generate_order_number(2026, 873), "BC-2026-0873");
    }
}
