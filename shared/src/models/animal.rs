//! Animal ("bête") models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An animal tracked through the operation, from reception to slaughter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    /// Live-animal ear tag, unique across the herd
    pub tag_number: String,
    /// Carcass tag assigned at slaughter time; globally unique when present
    pub slaughter_tag_number: Option<String>,
    pub species: AnimalType,
    pub sex: Sex,
    pub live_weight_kg: Decimal,
    /// Carcass weight right after slaughter; never exceeds live weight
    pub hot_weight_kg: Option<Decimal>,
    pub cold_weight_kg: Option<Decimal>,
    pub health_state: HealthState,
    pub status: AnimalStatus,
    pub urgent_slaughter: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Species handled by the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalType {
    Bovine,
    Ovine,
    Caprine,
}

impl AnimalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalType::Bovine => "bovine",
            AnimalType::Ovine => "ovine",
            AnimalType::Caprine => "caprine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bovine" => Some(AnimalType::Bovine),
            "ovine" => Some(AnimalType::Ovine),
            "caprine" => Some(AnimalType::Caprine),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnimalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimalType::Bovine => write!(f, "Bovine"),
            AnimalType::Ovine => write!(f, "Ovine"),
            AnimalType::Caprine => write!(f, "Caprine"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Good,
    Sick,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Good => "good",
            HealthState::Sick => "sick",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "good" => Some(HealthState::Good),
            "sick" => Some(HealthState::Sick),
            _ => None,
        }
    }
}

/// Status of an animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalStatus {
    Alive,
    InHolding,
    Slaughtered,
    Dead,
}

impl AnimalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalStatus::Alive => "alive",
            AnimalStatus::InHolding => "in_holding",
            AnimalStatus::Slaughtered => "slaughtered",
            AnimalStatus::Dead => "dead",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "alive" => Some(AnimalStatus::Alive),
            "in_holding" => Some(AnimalStatus::InHolding),
            "slaughtered" => Some(AnimalStatus::Slaughtered),
            "dead" => Some(AnimalStatus::Dead),
            _ => None,
        }
    }

    /// Whether the animal can still be placed into a holding lot
    pub fn is_available_for_holding(self) -> bool {
        matches!(self, AnimalStatus::Alive)
    }
}

impl std::fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimalStatus::Alive => write!(f, "Alive"),
            AnimalStatus::InHolding => write!(f, "In Holding"),
            AnimalStatus::Slaughtered => write!(f, "Slaughtered"),
            AnimalStatus::Dead => write!(f, "Dead"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animal_status_round_trip() {
        for status in [
            AnimalStatus::Alive,
            AnimalStatus::InHolding,
            AnimalStatus::Slaughtered,
            AnimalStatus::Dead,
        ] {
            assert_eq!(AnimalStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_holding_availability() {
        assert!(AnimalStatus::Alive.is_available_for_holding());
        assert!(!AnimalStatus::InHolding.is_available_for_holding());
        assert!(!AnimalStatus::Slaughtered.is_available_for_holding());
        assert!(!AnimalStatus::Dead.is_available_for_holding());
    }
}
