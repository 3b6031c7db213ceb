// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pre-Change Item Builder
//!
//! Turns a staged change document into pending destroy items before the
//! first event arrives. Each level of the document is processed in a fixed
//! order (resources, children, links), removed entries first:
//!
//! ```text
//! removed_resources   -> Resource(delete)
//! resource_changes    -> Resource(update)     unless also removed
//! removed_children    -> Child(delete)        nested doc from the snapshot
//! child_changes       -> Child(update)        nested doc from the changeset
//! removed_links       -> Link(delete)
//! changed links       -> Link(update)         unless also removed
//! ```
//!
//! Nested levels are created under the child's path so drill-down works
//! before the child reports anything.

use tracing::debug;

use super::{DestroyItem, ItemAction, ItemHandle, ItemHeader, ItemKind, ItemRegistry};
use crate::domain::{BlueprintChanges, BlueprintInstanceState};
use crate::paths::join_path;

/// Populate the registry from the root change document.
///
/// Root-level items are appended to the ordered root list. Returns the
/// number of items in the registry afterwards.
pub fn populate_from_changes(
    registry: &mut ItemRegistry,
    changes: &BlueprintChanges,
    snapshot: Option<&BlueprintInstanceState>,
) -> usize {
    let owner = snapshot.map(|state| state.instance_id.as_str());
    let handles = populate_level(registry, "", owner, changes, snapshot);
    for handle in handles {
        registry.push_root(handle);
    }
    debug!(items = registry.len(), "pre-populated destroy items");
    registry.len()
}

/// One entry at a single level of a change document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub kind: ItemKind,
    pub name: String,
    pub action: ItemAction,
}

/// Entries at one level of a change document, in document order.
///
/// Removed entries win over changed entries with the same name.
pub fn level_entries(changes: &BlueprintChanges) -> Vec<LevelEntry> {
    fn updates<'a>(
        names: impl Iterator<Item = &'a String>,
        removed: &'a [String],
    ) -> impl Iterator<Item = &'a String> {
        names.filter(move |name| !removed.contains(name))
    }

    let entry = |kind: ItemKind, action: ItemAction| {
        move |name: &String| LevelEntry {
            kind,
            name: name.clone(),
            action,
        }
    };

    let changed_links = changes.changed_links();
    let mut entries = Vec::new();
    entries.extend(
        changes
            .removed_resources
            .iter()
            .map(entry(ItemKind::Resource, ItemAction::Delete)),
    );
    entries.extend(
        updates(changes.resource_changes.keys(), &changes.removed_resources)
            .map(entry(ItemKind::Resource, ItemAction::Update)),
    );
    entries.extend(
        changes
            .removed_children
            .iter()
            .map(entry(ItemKind::Child, ItemAction::Delete)),
    );
    entries.extend(
        updates(changes.child_changes.keys(), &changes.removed_children)
            .map(entry(ItemKind::Child, ItemAction::Update)),
    );
    entries.extend(
        changes
            .removed_links
            .iter()
            .map(entry(ItemKind::Link, ItemAction::Delete)),
    );
    entries.extend(
        updates(changed_links.iter(), &changes.removed_links)
            .map(entry(ItemKind::Link, ItemAction::Update)),
    );
    entries
}

/// Nested change document of a child listed in `changes`.
///
/// A removed child has no diff of its own, so its contents are derived from
/// its pre-destroy snapshot.
pub fn child_document(
    changes: &BlueprintChanges,
    child_name: &str,
    child_snapshot: Option<&BlueprintInstanceState>,
) -> Option<BlueprintChanges> {
    if changes.removed_children.iter().any(|name| name == child_name) {
        return child_snapshot.map(BlueprintInstanceState::removal_changes);
    }
    changes.nested_changes_for(child_name)
}

/// Populate one level of a change document under `parent_path`, recursing
/// into nested children. Returns the handles created or found directly at
/// this level, in document order.
///
/// `owner_instance_id` is the instance that owns this level; only its
/// provisional items may be adopted into the level.
pub fn populate_level(
    registry: &mut ItemRegistry,
    parent_path: &str,
    owner_instance_id: Option<&str>,
    changes: &BlueprintChanges,
    snapshot: Option<&BlueprintInstanceState>,
) -> Vec<ItemHandle> {
    level_entries(changes)
        .into_iter()
        .map(|entry| {
            let LevelEntry { kind, name, action } = entry;
            match kind {
                ItemKind::Resource => {
                    resource_item(registry, parent_path, owner_instance_id, &name, action, snapshot)
                }
                ItemKind::Child => {
                    let child_snapshot = snapshot.and_then(|s| s.child(&name));
                    let nested = child_document(changes, &name, child_snapshot);
                    child_item(registry, parent_path, owner_instance_id, &name, action, nested, child_snapshot)
                }
                ItemKind::Link => {
                    let path = join_path(parent_path, &name);
                    registry.get_or_create(ItemKind::Link, &path, owner_instance_id, &name, false, || {
                        DestroyItem::link(ItemHeader::new(name.as_str(), action, path.as_str()))
                    })
                }
            }
        })
        .collect()
}

fn resource_item(
    registry: &mut ItemRegistry,
    parent_path: &str,
    owner_instance_id: Option<&str>,
    name: &str,
    action: ItemAction,
    snapshot: Option<&BlueprintInstanceState>,
) -> ItemHandle {
    let path = join_path(parent_path, name);
    let handle = registry.get_or_create(ItemKind::Resource, &path, owner_instance_id, name, false, || {
        DestroyItem::resource(ItemHeader::new(name, action, path.as_str()))
    });

    if let (Some(state), DestroyItem::Resource(item)) = (
        snapshot.and_then(|s| s.resource_by_name(name)),
        registry.get_mut(handle),
    ) {
        if item.resource_id.is_empty() {
            item.resource_id = state.resource_id.clone();
        }
        if item.resource_type.is_empty() {
            item.resource_type = state.resource_type.clone();
        }
    }
    handle
}

fn child_item(
    registry: &mut ItemRegistry,
    parent_path: &str,
    owner_instance_id: Option<&str>,
    name: &str,
    action: ItemAction,
    nested: Option<BlueprintChanges>,
    child_snapshot: Option<&BlueprintInstanceState>,
) -> ItemHandle {
    let path = join_path(parent_path, name);
    let handle = registry.get_or_create(ItemKind::Child, &path, owner_instance_id, name, false, || {
        DestroyItem::child(ItemHeader::new(name, action, path.as_str()))
    });

    let child_instance_id = child_snapshot
        .map(|state| state.instance_id.as_str())
        .filter(|id| !id.is_empty());
    if let DestroyItem::Child(item) = registry.get_mut(handle) {
        if item.changes.is_none() {
            item.changes = nested.clone();
        }
        if let (true, Some(id)) = (item.child_instance_id.is_empty(), child_instance_id) {
            item.child_instance_id = id.to_string();
        }
    }

    if let Some(nested) = nested {
        populate_level(registry, &path, child_instance_id, &nested, child_snapshot);
    }
    handle
}
