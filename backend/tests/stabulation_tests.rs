//! Holding lot finalization and cancellation tests for the Abattoir
//! Management Platform
//!
//! Covers the all-or-nothing finalization rules: submission completeness,
//! hot-weight bounds, post-slaughter tag uniqueness, and the
//! cancellation-reason constraints.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::{
    check_finalization, validate_cancellation_reason, FinalizationViolation, MemberLiveWeight,
};
use shared::{FinalizeEntry, StabulationStatus};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn member(id: i64, live: Decimal) -> MemberLiveWeight {
    MemberLiveWeight {
        animal_id: id,
        live_weight_kg: live,
    }
}

fn entry(id: i64, hot: Decimal, tag: &str) -> FinalizeEntry {
    FinalizeEntry {
        animal_id: id,
        hot_weight_kg: hot,
        slaughter_tag_number: tag.to_string(),
    }
}

fn no_tags(_: &str) -> bool {
    false
}

// ============================================================================
// Finalization weight properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any submission where every hot weight is positive and at most the
    /// live weight, with distinct tags, passes validation.
    #[test]
    fn property_hot_weight_within_live_weight_passes(
        live_kgs in prop::collection::vec(50u32..1000, 1..8),
        yield_percent in 40u32..100,
    ) {
        let members: Vec<MemberLiveWeight> = live_kgs
            .iter()
            .enumerate()
            .map(|(i, kg)| member(i as i64 + 1, Decimal::from(*kg)))
            .collect();
        let entries: Vec<FinalizeEntry> = members
            .iter()
            .map(|m| entry(
                m.animal_id,
                m.live_weight_kg * Decimal::from(yield_percent) / Decimal::from(100),
                &format!("P{}", m.animal_id),
            ))
            .collect();

        prop_assert!(check_finalization(&members, &entries, no_tags).is_ok());
    }

    /// A hot weight strictly above the live weight is always rejected,
    /// naming the offending animal.
    #[test]
    fn property_hot_weight_above_live_weight_is_rejected(
        live_kg in 50u32..1000,
        excess in 1u32..100,
    ) {
        let live = Decimal::from(live_kg);
        let hot = live + Decimal::from(excess);
        let members = [member(7, live)];
        let entries = [entry(7, hot, "P7")];

        prop_assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::WeightExceedsLiveWeight {
                animal_id: 7,
                hot_weight_kg: hot,
                live_weight_kg: live,
            })
        );
    }

    /// Removing any single entry from a complete submission yields an
    /// incompleteness violation naming exactly the removed animal.
    #[test]
    fn property_missing_entry_is_reported(
        count in 2usize..8,
        removed_index in 0usize..8,
    ) {
        let removed_index = removed_index % count;
        let members: Vec<MemberLiveWeight> = (0..count)
            .map(|i| member(i as i64 + 1, dec("400")))
            .collect();
        let entries: Vec<FinalizeEntry> = members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != removed_index)
            .map(|(_, m)| entry(m.animal_id, dec("200"), &format!("P{}", m.animal_id)))
            .collect();

        prop_assert_eq!(
            check_finalization(&members, &entries, no_tags),
            Err(FinalizationViolation::IncompleteSubmission {
                missing: vec![removed_index as i64 + 1]
            })
        );
    }

    /// Validation is a pure read: running it twice over the same
    /// submission gives the same verdict.
    #[test]
    fn property_validation_is_idempotent(
        live_kg in 50u32..1000,
        hot_kg in 50u32..1100,
    ) {
        let members = [member(1, Decimal::from(live_kg))];
        let entries = [entry(1, Decimal::from(hot_kg), "P1")];

        let first = check_finalization(&members, &entries, no_tags);
        let second = check_finalization(&members, &entries, no_tags);
        prop_assert_eq!(first, second);
    }
}

// ============================================================================
// Finalization scenarios
// ============================================================================

#[test]
fn test_finalize_rejects_overweight_member_and_names_it() {
    // Lot with members A1(live=300) and A2(live=250); A2's submitted hot
    // weight exceeds its live weight
    let members = [member(1, dec("300")), member(2, dec("250"))];
    let entries = [entry(1, dec("290"), "P1"), entry(2, dec("260"), "P2")];

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
fn test_finalize_accepts_corrected_submission() {
    let members = [member(1, dec("300")), member(2, dec("250"))];
    let entries = [entry(1, dec("290"), "P1"), entry(2, dec("240"), "P2")];

    assert!(check_finalization(&members, &entries, no_tags).is_ok());
}

#[test]
fn test_finalize_rejects_tag_used_anywhere_in_the_population() {
    // The duplicate check runs against every animal in the system, not
    // just lot members
    let members = [member(1, dec("300"))];
    let entries = [entry(1, dec("290"), "P-EXISTING")];

    assert_eq!(
        check_finalization(&members, &entries, |tag| tag == "P-EXISTING"),
        Err(FinalizationViolation::DuplicateTag {
            tag: "P-EXISTING".to_string()
        })
    );
}

#[test]
fn test_finalize_rejects_duplicate_tags_within_the_submission() {
    let members = [member(1, dec("300")), member(2, dec("250"))];
    let entries = [entry(1, dec("290"), "P1"), entry(2, dec("240"), "P1")];

    assert_eq!(
        check_finalization(&members, &entries, no_tags),
        Err(FinalizationViolation::DuplicateTag {
            tag: "P1".to_string()
        })
    );
}

#[test]
fn test_finalize_rejects_zero_hot_weight() {
    let members = [member(1, dec("300"))];
    let entries = [entry(1, Decimal::ZERO, "P1")];

    assert_eq!(
        check_finalization(&members, &entries, no_tags),
        Err(FinalizationViolation::InvalidWeight { animal_id: 1 })
    );
}

#[test]
fn test_finalize_rejects_whitespace_tag() {
    let members = [member(1, dec("300"))];
    let entries = [entry(1, dec("290"), "  ")];

    assert_eq!(
        check_finalization(&members, &entries, no_tags),
        Err(FinalizationViolation::MissingTag { animal_id: 1 })
    );
}

#[test]
fn test_finalize_empty_lot_succeeds_trivially() {
    assert!(check_finalization(&[], &[], no_tags).is_ok());
}

#[test]
fn test_finalize_rejects_entry_for_non_member() {
    let members = [member(1, dec("300"))];
    let entries = [entry(1, dec("290"), "P1"), entry(42, dec("100"), "P42")];

    assert_eq!(
        check_finalization(&members, &entries, no_tags),
        Err(FinalizationViolation::UnknownAnimal { animal_id: 42 })
    );
}

// ============================================================================
// Cancellation reason bounds
// ============================================================================

#[test]
fn test_cancellation_reason_boundary_lengths() {
    assert!(validate_cancellation_reason(&"x".repeat(9)).is_err());
    assert!(validate_cancellation_reason(&"x".repeat(10)).is_ok());
    assert!(validate_cancellation_reason(&"x".repeat(500)).is_ok());
    assert!(validate_cancellation_reason(&"x".repeat(501)).is_err());
}

#[test]
fn test_cancellation_reason_realistic_message() {
    assert!(validate_cancellation_reason("Sanitary issue detected").is_ok());
}

#[test]
fn test_cancellation_reason_counts_trimmed_characters() {
    // Surrounding whitespace does not count toward the minimum
    assert!(validate_cancellation_reason("   short    ").is_err());
}

// ============================================================================
// Lot status graph
// ============================================================================

#[test]
fn test_lot_terminal_transitions() {
    assert!(StabulationStatus::Active.can_transition_to(StabulationStatus::Finalized));
    assert!(StabulationStatus::Active.can_transition_to(StabulationStatus::Cancelled));

    // No transition ever leaves a terminal state
    for terminal in [StabulationStatus::Finalized, StabulationStatus::Cancelled] {
        for target in [
            StabulationStatus::Active,
            StabulationStatus::Finalized,
            StabulationStatus::Cancelled,
        ] {
            assert!(!terminal.can_transition_to(target));
        }
    }
}
