//! Audit history models
//!
//! History records are append-only: once written they are never mutated
//! or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable audit entry for a single field change or status event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub entity_type: HistoryEntityType,
    pub entity_id: i64,
    pub action: HistoryAction,
    /// Name of the changed field, absent for whole-entity events
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub recorded_at: DateTime<Utc>,
}

/// Kind of entity a history record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEntityType {
    Order,
    Stabulation,
    Animal,
}

impl HistoryEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEntityType::Order => "order",
            HistoryEntityType::Stabulation => "stabulation",
            HistoryEntityType::Animal => "animal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "order" => Some(HistoryEntityType::Order),
            "stabulation" => Some(HistoryEntityType::Stabulation),
            "animal" => Some(HistoryEntityType::Animal),
            _ => None,
        }
    }
}

/// What the audited operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Create,
    Update,
    StatusChange,
    Cancel,
    Finalize,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Create => "create",
            HistoryAction::Update => "update",
            HistoryAction::StatusChange => "status_change",
            HistoryAction::Cancel => "cancel",
            HistoryAction::Finalize => "finalize",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(HistoryAction::Create),
            "update" => Some(HistoryAction::Update),
            "status_change" => Some(HistoryAction::StatusChange),
            "cancel" => Some(HistoryAction::Cancel),
            "finalize" => Some(HistoryAction::Finalize),
            _ => None,
        }
    }
}

/// A single field-level change, as recorded by the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value,
            new_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip() {
        for action in [
            HistoryAction::Create,
            HistoryAction::Update,
            HistoryAction::StatusChange,
            HistoryAction::Cancel,
            HistoryAction::Finalize,
        ] {
            assert_eq!(HistoryAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_entity_type_round_trip() {
        for entity in [
            HistoryEntityType::Order,
            HistoryEntityType::Stabulation,
            HistoryEntityType::Animal,
        ] {
            assert_eq!(HistoryEntityType::from_str(entity.as_str()), Some(entity));
        }
    }
}
