// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Processor
//!
//! Folds the flat destroy event stream into the hierarchical item model.
//!
//! ```text
//! BlueprintInstanceEvent
//!        │
//!        ▼
//! ┌─────────────────┐   track_child    ┌─────────────┐
//! │ EventProcessor  │ ───────────────> │ PathBuilder │
//! │   process()     │ <─────────────── │             │
//! └─────────────────┘   ResolvedPath   └─────────────┘
//!        │
//!        │ resolve_or_insert / apply
//!        ▼
//! ┌─────────────────┐
//! │  ItemRegistry   │
//! └─────────────────┘
//! ```
//!
//! Resource, child and link updates resolve (or create) their item and copy
//! the event fields onto it. Only items owned by the root instance join the
//! ordered root list; nested items are reached through their child.
//!
//! Instance updates track the live root status and trigger an early
//! finalization as soon as the destroy starts rolling back. Finish events
//! are handed back to the caller, which owns the end-of-stream policy.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use crate::classify::is_rolling_back_or_failed;
use crate::domain::{BlueprintChanges, BlueprintInstanceState, InstanceStatus};
use crate::events::{
    BlueprintInstanceEvent, ChildUpdateMessage, DestroyEvent, FinishMessage,
    InstanceUpdateMessage, LinkUpdateMessage, ResourceUpdateMessage,
};
use crate::finalize::{finalize, FinalizeReport};
use crate::items::{
    child_document, populate_from_changes, populate_level, DestroyItem, ItemAction, ItemHandle,
    ItemHeader, ItemKind, ItemRegistry,
};
use crate::paths::{PathBuilder, ResolvedPath};

/// What processing one event did
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The event updated an item
    Applied(ItemHandle),
    /// Root status recorded
    StatusUpdated(InstanceStatus),
    /// Root status switched to rollback and pending work was settled early
    EarlyFinalized(FinalizeReport),
    /// The event ID was already applied
    Duplicate,
    /// Nothing to do for this event
    Ignored,
    /// The root instance finished; the caller decides what happens next
    Finish(FinishMessage),
}

/// Reducer state for the item model of one destroy session
#[derive(Debug, Clone, Default)]
pub struct EventProcessor {
    paths: PathBuilder,
    registry: ItemRegistry,
    changes: Option<BlueprintChanges>,
    pre_destroy: Option<BlueprintInstanceState>,
    seen_events: HashSet<String>,
    current_status: InstanceStatus,
    finalized: bool,
}

impl EventProcessor {
    pub fn new(root_instance_id: impl Into<String>) -> Self {
        Self {
            paths: PathBuilder::new(root_instance_id),
            ..Default::default()
        }
    }

    pub fn set_root_instance(&mut self, root_instance_id: impl Into<String>) {
        self.paths.set_root(root_instance_id);
    }

    /// Load the staged changes and pre-destroy snapshot and pre-create the
    /// pending items they describe.
    pub fn prime(
        &mut self,
        changes: Option<BlueprintChanges>,
        pre_destroy: Option<BlueprintInstanceState>,
    ) {
        self.changes = changes;
        self.pre_destroy = pre_destroy;
        if let Some(changes) = &self.changes {
            let items = populate_from_changes(&mut self.registry, changes, self.pre_destroy.as_ref());
            info!(items, "primed destroy items from changeset");
        }
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn paths(&self) -> &PathBuilder {
        &self.paths
    }

    pub fn changes(&self) -> Option<&BlueprintChanges> {
        self.changes.as_ref()
    }

    pub fn pre_destroy_state(&self) -> Option<&BlueprintInstanceState> {
        self.pre_destroy.as_ref()
    }

    /// Latest status reported for the root instance
    pub fn current_status(&self) -> InstanceStatus {
        self.current_status
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Apply one event
    pub fn process(&mut self, event: &BlueprintInstanceEvent) -> ProcessOutcome {
        if !event.id.is_empty() && !self.seen_events.insert(event.id.clone()) {
            debug!(event_id = %event.id, "skipping replayed event");
            return ProcessOutcome::Duplicate;
        }
        trace!(
            event_id = %event.id,
            event_type = event.payload.event_type_name(),
            instance_id = event.payload.instance_id(),
            "processing event"
        );

        match &event.payload {
            DestroyEvent::ResourceUpdate(update) => ProcessOutcome::Applied(self.apply_resource(update)),
            DestroyEvent::ChildUpdate(update) => ProcessOutcome::Applied(self.apply_child(update)),
            DestroyEvent::LinkUpdate(update) => ProcessOutcome::Applied(self.apply_link(update)),
            DestroyEvent::InstanceUpdate(update) => self.apply_instance(update),
            DestroyEvent::Finish(finish) => {
                if self.paths.is_root(&finish.instance_id) {
                    ProcessOutcome::Finish(finish.clone())
                } else {
                    ProcessOutcome::Ignored
                }
            }
        }
    }

    /// Run the terminal finalization once; later calls return `None`
    pub fn finalize(&mut self) -> Option<FinalizeReport> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        Some(finalize(&mut self.registry))
    }

    /// Record the root's final status without finalizing
    pub fn record_final_status(&mut self, status: InstanceStatus) {
        self.current_status = status;
    }

    fn apply_resource(&mut self, update: &ResourceUpdateMessage) -> ItemHandle {
        let resolved = self
            .paths
            .resolve_item_path(&update.instance_id, &update.resource_name);
        let (resource_id, resource_type) = self
            .snapshot_of(&update.instance_id)
            .and_then(|state| state.resource_by_name(&update.resource_name))
            .map(|state| (state.resource_id.clone(), state.resource_type.clone()))
            .unwrap_or_default();

        let (handle, created) = self.registry.resolve_or_insert(
            ItemKind::Resource,
            &update.instance_id,
            &update.resource_name,
            &resolved,
            |path| {
                let mut item = DestroyItem::resource(ItemHeader::new(
                    update.resource_name.as_str(),
                    ItemAction::Delete,
                    path,
                ));
                if let DestroyItem::Resource(resource) = &mut item {
                    resource.resource_id = resource_id;
                    resource.resource_type = resource_type;
                }
                item
            },
        );
        if created {
            debug!(path = %resolved.path, "discovered resource from event");
        }

        self.attach_to_root(&update.instance_id, handle);
        if let DestroyItem::Resource(item) = self.registry.get_mut(handle) {
            item.apply(update);
        }
        handle
    }

    fn apply_child(&mut self, update: &ChildUpdateMessage) -> ItemHandle {
        let new_edge = self.paths.track_child(
            &update.child_instance_id,
            &update.child_name,
            &update.parent_instance_id,
        );
        if new_edge {
            let moved = self.registry.promote_provisional(&self.paths);
            if moved > 0 {
                debug!(moved, child = %update.child_name, "promoted items after new child edge");
            }
        }

        let resolved = self
            .paths
            .resolve_item_path(&update.parent_instance_id, &update.child_name);
        let nested = self.nested_changes(update, &resolved);

        let (handle, created) = self.registry.resolve_or_insert(
            ItemKind::Child,
            &update.parent_instance_id,
            &update.child_name,
            &resolved,
            |path| {
                DestroyItem::child(ItemHeader::new(
                    update.child_name.as_str(),
                    ItemAction::Delete,
                    path,
                ))
            },
        );

        if created {
            debug!(path = %resolved.path, "discovered child from event");
            if let DestroyItem::Child(item) = self.registry.get_mut(handle) {
                item.changes = nested.clone();
            }
            if let (Some(nested), true) = (&nested, resolved.complete) {
                let child_snapshot = self
                    .pre_destroy
                    .as_ref()
                    .and_then(|state| state.find_instance(&update.child_instance_id));
                populate_level(
                    &mut self.registry,
                    &resolved.path,
                    Some(&update.child_instance_id),
                    nested,
                    child_snapshot,
                );
            }
        }

        self.attach_to_root(&update.parent_instance_id, handle);
        if let DestroyItem::Child(item) = self.registry.get_mut(handle) {
            item.apply(update);
        }
        handle
    }

    fn apply_link(&mut self, update: &LinkUpdateMessage) -> ItemHandle {
        let resolved = self
            .paths
            .resolve_item_path(&update.instance_id, &update.link_name);

        let (handle, created) = self.registry.resolve_or_insert(
            ItemKind::Link,
            &update.instance_id,
            &update.link_name,
            &resolved,
            |path| {
                DestroyItem::link(ItemHeader::new(
                    update.link_name.as_str(),
                    ItemAction::Delete,
                    path,
                ))
            },
        );
        if created {
            debug!(path = %resolved.path, "discovered link from event");
        }

        self.attach_to_root(&update.instance_id, handle);
        if let DestroyItem::Link(item) = self.registry.get_mut(handle) {
            item.apply(update);
        }
        handle
    }

    fn apply_instance(&mut self, update: &InstanceUpdateMessage) -> ProcessOutcome {
        if !self.paths.is_root(&update.instance_id) {
            return ProcessOutcome::Ignored;
        }
        self.current_status = update.status;

        if is_rolling_back_or_failed(update.status) && !self.finalized {
            let report = finalize(&mut self.registry);
            info!(
                status = %update.status,
                skipped = report.skipped,
                interrupted = report.interrupted,
                "destroy rolling back, settled pending items early"
            );
            return ProcessOutcome::EarlyFinalized(report);
        }
        ProcessOutcome::StatusUpdated(update.status)
    }

    fn attach_to_root(&mut self, owner_instance_id: &str, handle: ItemHandle) {
        if self.paths.is_root(owner_instance_id) {
            self.registry.push_root(handle);
        }
    }

    fn snapshot_of(&self, instance_id: &str) -> Option<&BlueprintInstanceState> {
        let state = self.pre_destroy.as_ref()?;
        if self.paths.is_root(instance_id) {
            Some(state)
        } else {
            state.find_instance(instance_id)
        }
    }

    /// Change document for a child first seen through an event.
    ///
    /// Looked up in the document of the level that owns the child: the
    /// top-level changes for root children, otherwise the document embedded
    /// in the parent child item. Without any document the child is treated
    /// as removed wholesale and its snapshot supplies the contents.
    fn nested_changes(
        &self,
        update: &ChildUpdateMessage,
        resolved: &ResolvedPath,
    ) -> Option<BlueprintChanges> {
        let child_snapshot = self
            .pre_destroy
            .as_ref()
            .and_then(|state| state.find_instance(&update.child_instance_id));

        let owner_document = if self.paths.is_root(&update.parent_instance_id) {
            self.changes.as_ref()
        } else {
            resolved
                .parent_path()
                .filter(|_| resolved.complete)
                .and_then(|parent| self.registry.find(ItemKind::Child, parent))
                .and_then(|parent| self.registry.get(parent).as_child())
                .and_then(|parent| parent.changes.as_ref())
        };

        match owner_document {
            Some(document) => child_document(document, &update.child_name, child_snapshot),
            None => child_snapshot.map(BlueprintInstanceState::removal_changes),
        }
    }
}
