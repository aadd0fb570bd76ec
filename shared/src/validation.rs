//! Validation rules for the abattoir workflows
//!
//! Single source of truth for the business rules the UI used to
//! re-implement in form handlers: weight bounds, tag uniqueness, and
//! cancellation-reason constraints.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::stabulation::FinalizeEntry;

/// Cancellation reasons must be within these bounds after trimming
pub const CANCELLATION_REASON_MIN_CHARS: usize = 10;
pub const CANCELLATION_REASON_MAX_CHARS: usize = 500;

// ============================================================================
// Order Validations
// ============================================================================

/// Validate the ordered quantity is strictly positive
pub fn validate_order_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a deposit amount is non-negative
pub fn validate_deposit(deposit: Decimal) -> Result<(), &'static str> {
    if deposit < Decimal::ZERO {
        return Err("Deposit cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Holding Lot Validations
// ============================================================================

/// Validate a cancellation reason: trimmed length within [10, 500] characters
pub fn validate_cancellation_reason(reason: &str) -> Result<(), &'static str> {
    let len = reason.trim().chars().count();
    if len < CANCELLATION_REASON_MIN_CHARS {
        return Err("Cancellation reason must be at least 10 characters");
    }
    if len > CANCELLATION_REASON_MAX_CHARS {
        return Err("Cancellation reason must be at most 500 characters");
    }
    Ok(())
}

/// Validate a lot member count against its capacity
pub fn validate_lot_capacity(member_count: usize, max_capacity: i32) -> Result<(), &'static str> {
    if max_capacity <= 0 {
        return Err("Lot capacity must be positive");
    }
    if member_count > max_capacity as usize {
        return Err("Lot capacity exceeded");
    }
    Ok(())
}

// ============================================================================
// Animal Validations
// ============================================================================

/// Validate a hot carcass weight against the recorded live weight.
/// Hot weight can never exceed live weight.
pub fn validate_hot_weight(hot_weight_kg: Decimal, live_weight_kg: Decimal) -> Result<(), &'static str> {
    if hot_weight_kg <= Decimal::ZERO {
        return Err("Hot weight must be positive");
    }
    if hot_weight_kg > live_weight_kg {
        return Err("Hot weight cannot exceed live weight");
    }
    Ok(())
}

/// Validate a live weight is strictly positive
pub fn validate_live_weight(live_weight_kg: Decimal) -> Result<(), &'static str> {
    if live_weight_kg <= Decimal::ZERO {
        return Err("Live weight must be positive");
    }
    Ok(())
}

// ============================================================================
// Finalization
// ============================================================================

/// Live-weight snapshot of a lot member, as read at finalization time
#[derive(Debug, Clone)]
pub struct MemberLiveWeight {
    pub animal_id: i64,
    pub live_weight_kg: Decimal,
}

/// A rule violation detected while validating a finalization submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizationViolation {
    #[error("finalization data missing for animals {missing:?}")]
    IncompleteSubmission { missing: Vec<i64> },

    #[error("animal {animal_id} is not a member of the lot")]
    UnknownAnimal { animal_id: i64 },

    #[error("hot weight for animal {animal_id} must be positive")]
    InvalidWeight { animal_id: i64 },

    #[error("hot weight {hot_weight_kg} kg exceeds live weight {live_weight_kg} kg for animal {animal_id}")]
    WeightExceedsLiveWeight {
        animal_id: i64,
        hot_weight_kg: Decimal,
        live_weight_kg: Decimal,
    },

    #[error("post-slaughter tag missing for animal {animal_id}")]
    MissingTag { animal_id: i64 },

    #[error("post-slaughter tag {tag:?} is already in use")]
    DuplicateTag { tag: String },
}

/// Validate a finalization submission against the lot members.
///
/// The completeness check reports every missing animal id at once;
/// per-entry validation then walks members in lot order and stops at the
/// first violation. `tag_in_use` answers whether a trimmed tag is already
/// assigned anywhere in the animal population; uniqueness within the
/// submission itself is checked here as well. An empty lot with an empty
/// submission passes trivially.
pub fn check_finalization(
    members: &[MemberLiveWeight],
    entries: &[FinalizeEntry],
    mut tag_in_use: impl FnMut(&str) -> bool,
) -> Result<(), FinalizationViolation> {
    let member_ids: HashSet<i64> = members.iter().map(|m| m.animal_id).collect();
    for entry in entries {
        if !member_ids.contains(&entry.animal_id) {
            return Err(FinalizationViolation::UnknownAnimal {
                animal_id: entry.animal_id,
            });
        }
    }

    let by_id: HashMap<i64, &FinalizeEntry> =
        entries.iter().map(|e| (e.animal_id, e)).collect();

    let mut missing: Vec<i64> = members
        .iter()
        .map(|m| m.animal_id)
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(FinalizationViolation::IncompleteSubmission { missing });
    }

    let mut seen_tags: HashSet<&str> = HashSet::new();
    for member in members {
        let entry = by_id[&member.animal_id];

        if entry.hot_weight_kg <= Decimal::ZERO {
            return Err(FinalizationViolation::InvalidWeight {
                animal_id: member.animal_id,
            });
        }
        if entry.hot_weight_kg > member.live_weight_kg {
            return Err(FinalizationViolation::WeightExceedsLiveWeight {
                animal_id: member.animal_id,
                hot_weight_kg: entry.hot_weight_kg,
                live_weight_kg: member.live_weight_kg,
            });
        }

        let tag = entry.slaughter_tag_number.trim();
        if tag.is_empty() {
            return Err(FinalizationViolation::MissingTag {
                animal_id: member.animal_id,
            });
        }
        if !seen_tags.insert(tag) || tag_in_use(tag) {
            return Err(FinalizationViolation::DuplicateTag {
                tag: tag.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn member(id: i64, live: &str) -> MemberLiveWeight {
        MemberLiveWeight {
            animal_id: id,
            live_weight_kg: dec(live),
        }
    }

    fn entry(id: i64, hot: &str, tag: &str) -> FinalizeEntry {
        FinalizeEntry {
            animal_id: id,
            hot_weight_kg: dec(hot),
            slaughter_tag_number: tag.to_string(),
        }
    }

    fn no_tags(_: &str) -> bool {
        false
    }

    // ========================================================================
    // Order Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_order_quantity() {
        assert!(validate_order_quantity(dec("12")).is_ok());
        assert!(validate_order_quantity(dec("0.5")).is_ok());
        assert!(validate_order_quantity(Decimal::ZERO).is_err());
        assert!(validate_order_quantity(dec("-3")).is_err());
    }

    #[test]
    fn test_validate_deposit() {
        assert!(validate_deposit(Decimal::ZERO).is_ok());
        assert!(validate_deposit(dec("150.75")).is_ok());
        assert!(validate_deposit(dec("-0.01")).is_err());
    }

    // ========================================================================
    // Cancellation Reason Tests
    // ========================================================================

    #[test]
    fn test_cancellation_reason_boundaries() {
        assert!(validate_cancellation_reason(&"x".repeat(9)).is_err());
        assert!(validate_cancellation_reason(&"x".repeat(10)).is_ok());
        assert!(validate_cancellation_reason(&"x".repeat(500)).is_ok());
        assert!(validate_cancellation_reason(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_cancellation_reason_is_trimmed() {
        // 9 meaningful characters padded with whitespace still fails
        assert!(validate_cancellation_reason("  abcdefghi  ").is_err());
        assert!(validate_cancellation_reason("  abcdefghij  ").is_ok());
    }

    // ========================================================================
    // Capacity Tests
    // ========================================================================

    #[test]
    fn test_lot_capacity() {
        assert!(validate_lot_capacity(0, 10).is_ok());
        assert!(validate_lot_capacity(10, 10).is_ok());
        assert!(validate_lot_capacity(11, 10).is_err());
        assert!(validate_lot_capacity(0, 0).is_err());
    }

    // ========================================================================
    // Weight Tests
    // ========================================================================

    #[test]
    fn test_hot_weight_bounds() {
        assert!(validate_hot_weight(dec("250"), dec("300")).is_ok());
        // Equal weights are physically implausible but not forbidden
        assert!(validate_hot_weight(dec("300"), dec("300")).is_ok());
        assert!(validate_hot_weight(dec("300.01"), dec("300")).is_err());
        assert!(validate_hot_weight(Decimal::ZERO, dec("300")).is_err());
        assert!(validate_hot_weight(dec("-5"), dec("300")).is_err());
    }

    #[test]
    fn test_live_weight() {
        assert!(validate_live_weight(dec("420.5")).is_ok());
        assert!(validate_live_weight(Decimal::ZERO).is_err());
    }

    // ========================================================================
    // Finalization Tests
    // ========================================================================

    #[test]
    fn test_finalization_empty_lot_trivially_succeeds() {
        assert!(check_finalization(&[], &[], no_tags).is_ok());
    }

    #[test]
    fn test_finalization_valid_submission() {
        let members = [member(1, "300"), member(2, "250")];
        let entries = [entry(1, "290", "P1"), entry(2, "240", "P2")];
        assert!(check_finalization(&members, &entries, no_tags).is_ok());
    }

    #[test]
    fn test_finalization_reports_all_missing_animals() {
        let members = [member(1, "300"), member(2, "250"), member(3, "280")];
        let entries = [entry(2, "240", "P2")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::IncompleteSubmission {
                missing: vec![1, 3]
            })
        );
    }

    #[test]
    fn test_finalization_rejects_unknown_animal() {
        let members = [member(1, "300")];
        let entries = [entry(1, "290", "P1"), entry(99, "100", "P9")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::UnknownAnimal { animal_id: 99 })
        );
    }

    #[test]
    fn test_finalization_rejects_nonpositive_weight() {
        let members = [member(1, "300")];
        let entries = [entry(1, "0", "P1")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::InvalidWeight { animal_id: 1 })
        );
    }

    #[test]
    fn test_finalization_rejects_hot_weight_above_live_weight() {
        let members = [member(1, "300"), member(2, "250")];
        let entries = [entry(1, "290", "P1"), entry(2, "260", "P2")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::WeightExceedsLiveWeight {
                animal_id: 2,
                hot_weight_kg: dec("260"),
                live_weight_kg: dec("250"),
            })
        );
    }

    #[test]
    fn test_finalization_rejects_blank_tag() {
        let members = [member(1, "300")];
        let entries = [entry(1, "290", "   ")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::MissingTag { animal_id: 1 })
        );
    }

    #[test]
    fn test_finalization_rejects_tag_taken_elsewhere() {
        let members = [member(1, "300")];
        let entries = [entry(1, "290", "P1")];
        assert_eq!(
            check_finalization(&members, &entries, |tag| tag == "P1"),
            Err(FinalizationViolation::DuplicateTag {
                tag: "P1".to_string()
            })
        );
    }

    #[test]
    fn test_finalization_rejects_duplicate_tag_within_submission() {
        let members = [member(1, "300"), member(2, "250")];
        let entries = [entry(1, "290", "P1"), entry(2, "240", "P1")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::DuplicateTag {
                tag: "P1".to_string()
            })
        );
    }

    #[test]
    fn test_finalization_no_violation_masks_another() {
        // Weight check fires before the tag check for the same member
        let members = [member(1, "300")];
        let entries = [entry(1, "310", "")];
        assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::WeightExceedsLiveWeight {
                animal_id: 1,
                hot_weight_kg: dec("310"),
                live_weight_kg: dec("300"),
            })
        );
    }
}
