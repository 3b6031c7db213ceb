// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Result Collection
//!
//! After finalization the destroyed, failed and interrupted lists together
//! name every item of the operation exactly once, including the contents
//! of child blueprints known only from the change set.

use std::collections::BTreeSet;

use blueprint_destroy::domain::{BlueprintChanges, InstanceStatus, ResourceStatus};
use blueprint_destroy::items::DestroyItem;
use blueprint_destroy::processor::EventProcessor;
use blueprint_destroy::results::{collect_results, RESULT_PATH_SEPARATOR};
use proptest::option;
use proptest::prelude::*;

use crate::fixtures::*;

// ============================================================================
// Strategies
// ============================================================================

fn resource_status() -> impl Strategy<Value = ResourceStatus> {
    prop_oneof![
        Just(ResourceStatus::Destroying),
        Just(ResourceStatus::Destroyed),
        Just(ResourceStatus::DestroyFailed),
        Just(ResourceStatus::DestroyInterrupted),
        Just(ResourceStatus::RollingBack),
    ]
}

fn child_status() -> impl Strategy<Value = InstanceStatus> {
    prop_oneof![
        Just(InstanceStatus::Unknown),
        Just(InstanceStatus::Destroying),
        Just(InstanceStatus::Destroyed),
        Just(InstanceStatus::DestroyInterrupted),
        Just(InstanceStatus::DestroyRollingBack),
    ]
}

/// Reported statuses for one child blueprint and its resources
type ChildPlan = (InstanceStatus, Vec<Option<ResourceStatus>>);

fn destroy_plan() -> impl Strategy<Value = (Vec<Option<ResourceStatus>>, Vec<ChildPlan>)> {
    (
        prop::collection::vec(option::of(resource_status()), 0..4),
        prop::collection::vec(
            (child_status(), prop::collection::vec(option::of(resource_status()), 0..4)),
            0..3,
        ),
    )
}

fn reasons_for(status: ResourceStatus) -> &'static [&'static str] {
    match status {
        ResourceStatus::DestroyFailed => &["provider error"],
        _ => &[],
    }
}

/// Result path an item is expected under
fn expected_result_path(item: &DestroyItem) -> String {
    let segments: Vec<&str> = item.path().split('/').collect();
    let Some((name, parents)) = segments.split_last() else {
        return String::new();
    };
    parents
        .iter()
        .map(|parent| format!("children.{parent}"))
        .chain(std::iter::once(format!("{}.{name}", item.kind().collection())))
        .collect::<Vec<_>>()
        .join(RESULT_PATH_SEPARATOR)
}

fn run(root: &[Option<ResourceStatus>], children: &[ChildPlan]) -> EventProcessor {
    let root_names: Vec<String> = (0..root.len()).map(|i| format!("r{i}")).collect();
    let root_refs: Vec<&str> = root_names.iter().map(String::as_str).collect();
    let mut snapshot = snapshot_with_resources(ROOT_INSTANCE_ID, &root_refs);

    let mut changes = BlueprintChanges {
        removed_resources: root_names.clone(),
        ..Default::default()
    };
    for (c, (_, resources)) in children.iter().enumerate() {
        let names: Vec<String> = (0..resources.len()).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        snapshot.child_blueprints.insert(
            format!("c{c}"),
            snapshot_with_resources(&format!("inst-c{c}"), &refs),
        );
        changes.removed_children.push(format!("c{c}"));
    }

    let mut processor = EventProcessor::new(ROOT_INSTANCE_ID);
    processor.prime(Some(changes), Some(snapshot));

    let mut n = 0;
    for (i, status) in root.iter().enumerate() {
        if let Some(status) = status {
            n += 1;
            processor.process(&resource_event(n, ROOT_INSTANCE_ID, &format!("r{i}"), *status, reasons_for(*status)));
        }
    }
    for (c, (status, resources)) in children.iter().enumerate() {
        let instance = format!("inst-c{c}");
        n += 1;
        processor.process(&child_event(n, ROOT_INSTANCE_ID, &instance, &format!("c{c}"), *status));
        for (i, status) in resources.iter().enumerate() {
            if let Some(status) = status {
                n += 1;
                processor.process(&resource_event(n, &instance, &format!("n{i}"), *status, reasons_for(*status)));
            }
        }
    }
    processor.finalize();
    processor
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: every item is filed exactly once
    #[test]
    fn prop_results_are_exhaustive((root, children) in destroy_plan()) {
        let processor = run(&root, &children);
        let results = collect_results(processor.registry());

        let filed: Vec<&str> = results.all_paths().collect();
        let unique: BTreeSet<&str> = filed.iter().copied().collect();
        prop_assert_eq!(filed.len(), unique.len(), "duplicate entries in {:?}", filed);

        let expected: BTreeSet<String> = processor
            .registry()
            .iter()
            .map(|(_, item)| expected_result_path(item))
            .collect();
        let filed: BTreeSet<String> = unique.into_iter().map(str::to_string).collect();
        prop_assert_eq!(filed, expected);
    }

    /// Property: the number of filed elements matches the planned items
    #[test]
    fn prop_result_count_matches_plan((root, children) in destroy_plan()) {
        let processor = run(&root, &children);
        let results = collect_results(processor.registry());

        let planned = root.len()
            + children.iter().map(|(_, resources)| 1 + resources.len()).sum::<usize>();
        prop_assert_eq!(results.len(), planned);
    }
}
