// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Provisional Item Migration
//!
//! Items seen before their owning child blueprint is announced are stored
//! provisionally and moved once the path resolves. Every field set before
//! the move survives it, and later events never create a second copy.

use blueprint_destroy::domain::{BlueprintChanges, InstanceStatus, ResourceStatus};
use blueprint_destroy::items::{DestroyItem, ItemKind};
use blueprint_destroy::processor::EventProcessor;
use proptest::prelude::*;

use crate::fixtures::*;

// ============================================================================
// Strategies
// ============================================================================

fn item_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("db"), Just("vpc"), Just("queue")].prop_map(str::to_string)
}

fn destroy_status() -> impl Strategy<Value = ResourceStatus> {
    prop_oneof![
        Just(ResourceStatus::Destroying),
        Just(ResourceStatus::Destroyed),
        Just(ResourceStatus::DestroyFailed),
        Just(ResourceStatus::RollingBack),
    ]
}

fn failure_reasons() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}( [a-z]{1,8})?", 0..3)
}

fn processor(pre_created: bool, name: &str) -> EventProcessor {
    let mut processor = EventProcessor::new(ROOT_INSTANCE_ID);
    if pre_created {
        let mut snapshot = snapshot_with_resources(ROOT_INSTANCE_ID, &[]);
        snapshot.child_blueprints.insert(
            "network".to_string(),
            snapshot_with_resources(CHILD_INSTANCE_ID, &[name]),
        );
        let changes = BlueprintChanges {
            removed_children: vec!["network".to_string()],
            ..Default::default()
        };
        processor.prime(Some(changes), Some(snapshot));
    }
    processor
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: migration keeps fields and happens at most once
    #[test]
    fn prop_migration_preserves_fields(
        name in item_name(),
        status in destroy_status(),
        reasons in failure_reasons(),
        pre_created in any::<bool>(),
    ) {
        let mut processor = processor(pre_created, &name);
        let reason_refs: Vec<&str> = reasons.iter().map(String::as_str).collect();

        processor.process(&resource_event(1, CHILD_INSTANCE_ID, &name, status, &reason_refs));
        processor.process(&child_event(2, ROOT_INSTANCE_ID, CHILD_INSTANCE_ID, "network", InstanceStatus::Destroying));

        let path = format!("network/{name}");
        let handle = processor.registry().find(ItemKind::Resource, &path);
        prop_assert!(handle.is_some(), "item reachable at {}", path);
        let handle = handle.unwrap();

        let DestroyItem::Resource(item) = processor.registry().get(handle) else {
            return Err(TestCaseError::fail("expected a resource"));
        };
        prop_assert_eq!(item.status, status);
        prop_assert_eq!(&item.header.failure_reasons, &reasons);
        prop_assert_eq!(item.resource_id.clone(), format!("res-{name}"));
        prop_assert_eq!(processor.registry().len(), 2);

        // the same edge again, then another update for the item
        processor.process(&child_event(3, ROOT_INSTANCE_ID, CHILD_INSTANCE_ID, "network", InstanceStatus::Destroying));
        processor.process(&resource_event(4, CHILD_INSTANCE_ID, &name, ResourceStatus::Destroyed, &[]));

        prop_assert_eq!(processor.registry().len(), 2);
        prop_assert_eq!(processor.registry().find(ItemKind::Resource, &path), Some(handle));
        prop_assert_eq!(
            processor.registry().get(handle).class(),
            blueprint_destroy::StatusClass::Succeeded
        );
    }
}
