// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Reconciliation Payloads
//!
//! Approving a drift block produces exactly one action per reported
//! resource and link, and one intermediary action per intermediary change.

use std::collections::BTreeMap;

use blueprint_destroy::domain::{
    IntermediaryReconcileResult, LinkReconcileResult, ReconcileAction, ReconciliationCheckResult,
    ResourceReconcileResult,
};
use blueprint_destroy::drift::{
    build_display_tree, build_payload, DriftCoordinator, INTERMEDIARY_PLACEHOLDER_STATUS,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn child_path() -> impl Strategy<Value = String> {
    prop_oneof![Just(""), Just("network"), Just("network.core"), Just("storage")]
        .prop_map(str::to_string)
}

fn action() -> impl Strategy<Value = ReconcileAction> {
    prop_oneof![
        Just(ReconcileAction::AcceptExternal),
        Just(ReconcileAction::UpdateStatus),
        Just(ReconcileAction::MarkFailed),
    ]
}

fn resource() -> impl Strategy<Value = ResourceReconcileResult> {
    ("[a-z]{1,8}", child_path(), action()).prop_map(|(name, child_path, action)| {
        ResourceReconcileResult {
            resource_id: format!("res-{name}"),
            resource_name: name,
            child_path,
            recommended_action: action,
            ..Default::default()
        }
    })
}

fn link() -> impl Strategy<Value = LinkReconcileResult> {
    (
        "[a-z]{1,6}::[a-z]{1,6}",
        child_path(),
        action(),
        prop::collection::btree_set("[a-z]{1,6}", 0..4),
    )
        .prop_map(|(name, child_path, action, intermediaries)| {
            let intermediary_changes: BTreeMap<String, IntermediaryReconcileResult> =
                intermediaries
                    .into_iter()
                    .map(|name| {
                        (
                            name.clone(),
                            IntermediaryReconcileResult {
                                name,
                                ..Default::default()
                            },
                        )
                    })
                    .collect();
            LinkReconcileResult {
                link_id: format!("link-{name}"),
                link_name: name,
                child_path,
                intermediary_changes,
                recommended_action: action,
                ..Default::default()
            }
        })
}

fn check_result() -> impl Strategy<Value = ReconciliationCheckResult> {
    (
        prop::collection::vec(resource(), 0..6),
        prop::collection::vec(link(), 0..4),
    )
        .prop_map(|(resources, links)| ReconciliationCheckResult {
            instance_id: "inst-root".to_string(),
            has_drift: true,
            resources,
            links,
            ..Default::default()
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: one action per entry, with the recommended action
    #[test]
    fn prop_payload_has_one_action_per_entry(result in check_result()) {
        let payload = build_payload(&result);

        prop_assert_eq!(payload.resource_actions.len(), result.resources.len());
        prop_assert_eq!(payload.link_actions.len(), result.links.len());

        for (action, resource) in payload.resource_actions.iter().zip(&result.resources) {
            prop_assert_eq!(&action.resource_id, &resource.resource_id);
            prop_assert_eq!(&action.child_path, &resource.child_path);
            prop_assert_eq!(action.action.as_str(), resource.recommended_action.as_str());
        }
        for (action, link) in payload.link_actions.iter().zip(&result.links) {
            prop_assert_eq!(action.intermediary_actions.len(), link.intermediary_changes.len());
            for (name, intermediary) in &action.intermediary_actions {
                prop_assert!(link.intermediary_changes.contains_key(name));
                prop_assert_eq!(intermediary.new_status.as_str(), INTERMEDIARY_PLACEHOLDER_STATUS);
            }
        }
    }

    /// Property: the display tree holds every entry once
    #[test]
    fn prop_display_tree_holds_every_entry(result in check_result()) {
        let tree = build_display_tree(&result);
        prop_assert_eq!(tree.entry_count(), result.resources.len() + result.links.len());
    }

    /// Property: approve then applied returns the coordinator to normal
    /// with the payload the result describes
    #[test]
    fn prop_coordinator_round_trip(result in check_result(), changeset in "[a-z0-9-]{0,12}") {
        let mut drift = DriftCoordinator::new();
        drift.block("Drift detected", changeset.clone(), result.clone()).unwrap();
        let payload = drift.approve().unwrap();
        prop_assert_eq!(payload, build_payload(&result));

        let resumed = drift.applied().unwrap();
        prop_assert_eq!(resumed, Some(changeset).filter(|id| !id.is_empty()));
        prop_assert!(!drift.is_blocked());
        prop_assert!(drift.view().is_none());
    }
}
