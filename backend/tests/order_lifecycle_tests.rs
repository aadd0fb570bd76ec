//! Purchase order lifecycle tests for the Abattoir Management Platform
//!
//! Covers the order status graph: forward progression, cancellation
//! reachability, and edit/delete gating.

use proptest::prelude::*;
use shared::OrderStatus;

const ALL_STATUSES: [OrderStatus; 5] = [
    OrderStatus::Draft,
    OrderStatus::Confirmed,
    OrderStatus::InProgress,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// The complete set of permitted edges in the status graph
fn is_permitted_edge(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Draft, Confirmed)
            | (Confirmed, InProgress)
            | (InProgress, Delivered)
            | (Draft, Cancelled)
            | (Confirmed, Cancelled)
            | (InProgress, Cancelled)
    )
}

fn any_status() -> impl Strategy<Value = OrderStatus> {
    proptest::sample::select(ALL_STATUSES.to_vec())
}

// ============================================================================
// Transition graph properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every (from, to) pair agrees with the explicit edge list: nothing
    /// outside the directed graph is ever permitted.
    #[test]
    fn property_transition_graph_is_exactly_the_permitted_edges(
        from in any_status(),
        to in any_status(),
    ) {
        prop_assert_eq!(from.can_transition_to(to), is_permitted_edge(from, to));
    }

    /// Terminal statuses permit no outgoing transition at all.
    #[test]
    fn property_terminal_statuses_have_no_outgoing_edges(to in any_status()) {
        prop_assert!(!OrderStatus::Delivered.can_transition_to(to));
        prop_assert!(!OrderStatus::Cancelled.can_transition_to(to));
    }

    /// No status can transition to itself.
    #[test]
    fn property_no_self_transitions(status in any_status()) {
        prop_assert!(!status.can_transition_to(status));
    }
}

// ============================================================================
// Forward progression
// ============================================================================

#[test]
fn test_confirm_start_deliver_succeeds_only_in_exact_order() {
    // The happy path walks the graph one edge at a time
    assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Confirmed));
    assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::InProgress));
    assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Delivered));

    // Deliver on a draft order is rejected
    assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::Delivered));
    // Start before confirmation is rejected
    assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::InProgress));
    // Confirm twice is rejected
    assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    // Deliver before starting is rejected
    assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
}

#[test]
fn test_no_backward_edges() {
    assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Draft));
    assert!(!OrderStatus::InProgress.can_transition_to(OrderStatus::Confirmed));
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::InProgress));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_succeeds_from_every_non_terminal_status() {
    assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Cancelled));
    assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
    assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Cancelled));
}

#[test]
fn test_cancel_fails_from_terminal_statuses() {
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
}

// ============================================================================
// Edit and delete gating
// ============================================================================

#[test]
fn test_orders_are_editable_until_execution_starts() {
    assert!(OrderStatus::Draft.is_editable());
    assert!(OrderStatus::Confirmed.is_editable());
    assert!(!OrderStatus::InProgress.is_editable());
    assert!(!OrderStatus::Delivered.is_editable());
    assert!(!OrderStatus::Cancelled.is_editable());
}

#[test]
fn test_only_draft_orders_are_deletable() {
    for status in ALL_STATUSES {
        assert_eq!(status.is_deletable(), status == OrderStatus::Draft);
    }
}

#[test]
fn test_terminal_statuses() {
    assert!(OrderStatus::Delivered.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());
    assert!(!OrderStatus::Draft.is_terminal());
    assert!(!OrderStatus::Confirmed.is_terminal());
    assert!(!OrderStatus::InProgress.is_terminal());
}

// ============================================================================
// Wire representation
// ============================================================================

#[test]
fn test_status_serializes_as_snake_case() {
    assert_eq!(
        serde_json::to_string(&OrderStatus::InProgress).unwrap(),
        "\"in_progress\""
    );
    let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
    assert_eq!(parsed, OrderStatus::Cancelled);
}
