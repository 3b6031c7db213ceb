// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Finalization
//!
//! After a destroy ends, no item that was part of the operation is left
//! pending or in progress, and finalizing again changes nothing.

use blueprint_destroy::classify::StatusClass;
use blueprint_destroy::domain::{BlueprintChanges, LinkStatus, ResourceStatus};
use blueprint_destroy::finalize::{finalize, is_settled, FinalizeReport};
use blueprint_destroy::processor::EventProcessor;
use proptest::prelude::*;
use proptest::option;

use crate::fixtures::*;

// ============================================================================
// Strategies
// ============================================================================

fn resource_status() -> impl Strategy<Value = ResourceStatus> {
    prop_oneof![
        Just(ResourceStatus::Unknown),
        Just(ResourceStatus::Destroying),
        Just(ResourceStatus::RollingBack),
        Just(ResourceStatus::Destroyed),
        Just(ResourceStatus::DestroyFailed),
        Just(ResourceStatus::RollbackFailed),
        Just(ResourceStatus::DestroyInterrupted),
    ]
}

fn link_status() -> impl Strategy<Value = LinkStatus> {
    prop_oneof![
        Just(LinkStatus::Unknown),
        Just(LinkStatus::Destroying),
        Just(LinkStatus::DestroyRollingBack),
        Just(LinkStatus::Destroyed),
        Just(LinkStatus::DestroyFailed),
        Just(LinkStatus::DestroyInterrupted),
    ]
}

/// Last reported status per resource and per link; `None` means no event
fn reported_statuses(
) -> impl Strategy<Value = (Vec<Option<ResourceStatus>>, Vec<Option<LinkStatus>>)> {
    (
        prop::collection::vec(option::of(resource_status()), 1..8),
        prop::collection::vec(option::of(link_status()), 0..4),
    )
}

fn run(resources: &[Option<ResourceStatus>], links: &[Option<LinkStatus>]) -> EventProcessor {
    let changes = BlueprintChanges {
        removed_resources: (0..resources.len()).map(|i| format!("r{i}")).collect(),
        removed_links: (0..links.len()).map(|i| format!("fn{i}::r{i}")).collect(),
        ..Default::default()
    };
    let mut processor = EventProcessor::new(ROOT_INSTANCE_ID);
    processor.prime(Some(changes), None);

    let mut n = 0;
    for (i, status) in resources.iter().enumerate() {
        if let Some(status) = status {
            n += 1;
            processor.process(&resource_event(n, ROOT_INSTANCE_ID, &format!("r{i}"), *status, &[]));
        }
    }
    for (i, status) in links.iter().enumerate() {
        if let Some(status) = status {
            n += 1;
            processor.process(&link_event(n, ROOT_INSTANCE_ID, &format!("fn{i}::r{i}"), *status));
        }
    }
    processor
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: every item ends in exactly one settled state
    #[test]
    fn prop_finalization_is_complete((resources, links) in reported_statuses()) {
        let mut processor = run(&resources, &links);
        let report = processor.finalize().unwrap_or_default();

        let mut skipped = 0;
        for (_, item) in processor.registry().iter() {
            prop_assert!(is_settled(item), "{} left unsettled", item.path());
            let states = [
                item.is_skipped() && item.class() == StatusClass::Pending,
                item.class() == StatusClass::Interrupted,
                item.class() == StatusClass::Succeeded,
                item.class() == StatusClass::Failed,
            ];
            prop_assert_eq!(states.iter().filter(|s| **s).count(), 1, "{} in {:?}", item.path(), item.class());
            if item.is_skipped() {
                skipped += 1;
            }
        }
        prop_assert_eq!(report.skipped, skipped);

        let expected_interrupted = resources
            .iter()
            .flatten()
            .filter(|s| matches!(s, ResourceStatus::Destroying | ResourceStatus::RollingBack))
            .count()
            + links
                .iter()
                .flatten()
                .filter(|s| matches!(s, LinkStatus::Destroying | LinkStatus::DestroyRollingBack))
                .count();
        prop_assert_eq!(report.interrupted, expected_interrupted);
    }

    /// Property: finalization runs once and is idempotent
    #[test]
    fn prop_finalization_is_idempotent((resources, links) in reported_statuses()) {
        let mut processor = run(&resources, &links);
        processor.finalize();
        prop_assert!(processor.finalize().is_none());

        let mut registry = processor.registry().clone();
        prop_assert_eq!(finalize(&mut registry), FinalizeReport::default());
    }
}
