// Copyright (c) 2025 - Cowboy AI, Inc.
//! Item Registry
//!
//! Canonical store of every destroy item known to a session.
//!
//! # Storage
//!
//! Items live in an append-only arena addressed by [`ItemHandle`]. The arena
//! never shrinks: items are updated in place or moved to a new key, never
//! removed. Three indexes sit on top of it:
//!
//! - `by_path`: (kind, path) → handle, the canonical address
//! - `provisional`: (kind, owning instance ID, name) → handle, for items
//!   whose ancestry was unknown when they were first seen
//! - `nested`: child path → handles of the items directly inside it
//!
//! # Two-phase resolution
//!
//! An event can reference an item before the child blueprint that owns it
//! has been announced. Such an item is stored under the partial path the
//! [`PathBuilder`](crate::paths::PathBuilder) could derive, prefixed with its
//! owning instance ID, and is remembered by that instance ID and name. Once
//! the ancestry is known, the item is moved to its final path in a single
//! `&mut self` call, so no reader ever observes it under both keys or under
//! neither.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::{DestroyItem, ItemKind};
use crate::paths::{PathBuilder, ResolvedPath};

/// Separates the owning instance ID from the partial path of an item whose
/// ancestry is unresolved
pub const UNRESOLVED_MARKER: char = '#';

/// Stable handle of an item in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemHandle(usize);

impl ItemHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PathKey {
    kind: ItemKind,
    path: String,
}

impl PathKey {
    fn new(kind: ItemKind, path: &str) -> Self {
        Self {
            kind,
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProvisionalKey {
    kind: ItemKind,
    instance_id: String,
    name: String,
}

impl ProvisionalKey {
    fn new(kind: ItemKind, instance_id: &str, name: &str) -> Self {
        Self {
            kind,
            instance_id: instance_id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Path-keyed store of the items in one destroy session
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: Vec<DestroyItem>,
    by_path: HashMap<PathKey, ItemHandle>,
    provisional: HashMap<ProvisionalKey, ItemHandle>,
    nested: HashMap<String, Vec<ItemHandle>>,
    roots: Vec<ItemHandle>,
    /// Provisional items folded into the settled item at the same path
    merged: HashMap<ItemHandle, ItemHandle>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len() - self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, handle: ItemHandle) -> &DestroyItem {
        &self.items[handle.0]
    }

    pub fn get_mut(&mut self, handle: ItemHandle) -> &mut DestroyItem {
        &mut self.items[handle.0]
    }

    /// Every live item, in creation order
    pub fn iter(&self) -> impl Iterator<Item = (ItemHandle, &DestroyItem)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (ItemHandle(index), item))
            .filter(|(handle, _)| !self.merged.contains_key(handle))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DestroyItem> {
        let merged = &self.merged;
        self.items
            .iter_mut()
            .enumerate()
            .filter(move |(index, _)| !merged.contains_key(&ItemHandle(*index)))
            .map(|(_, item)| item)
    }

    /// Items of one kind, keyed by path
    pub fn by_kind(&self, kind: ItemKind) -> HashMap<&str, &DestroyItem> {
        self.iter()
            .map(|(_, item)| item)
            .filter(|item| item.kind() == kind)
            .map(|item| (item.path(), item))
            .collect()
    }

    /// The live handle for `handle`, following merges
    pub fn canonical(&self, handle: ItemHandle) -> ItemHandle {
        let mut current = handle;
        while let Some(next) = self.merged.get(&current) {
            current = *next;
        }
        current
    }

    /// Look up an item by its canonical path
    pub fn find(&self, kind: ItemKind, path: &str) -> Option<ItemHandle> {
        self.by_path.get(&PathKey::new(kind, path)).copied()
    }

    /// Look up an item by path, then among the provisional items of
    /// `owner_instance_id`.
    pub fn lookup(
        &self,
        kind: ItemKind,
        path: &str,
        owner_instance_id: Option<&str>,
        name: &str,
    ) -> Option<ItemHandle> {
        self.find(kind, path)
            .or_else(|| self.find_provisional(kind, owner_instance_id, name))
    }

    /// Items owned directly by the root instance, in first-seen order
    pub fn roots(&self) -> &[ItemHandle] {
        &self.roots
    }

    pub fn root_items(&self) -> impl Iterator<Item = &DestroyItem> {
        self.roots.iter().map(|handle| self.get(*handle))
    }

    /// Append an item to the ordered root list; repeated calls are no-ops
    pub fn push_root(&mut self, handle: ItemHandle) {
        if !self.roots.contains(&handle) {
            self.roots.push(handle);
        }
    }

    /// Items directly inside the child at `child_path`, in first-seen order
    pub fn children_of(&self, child_path: &str) -> &[ItemHandle] {
        self.nested
            .get(child_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `true` while the item's ancestry is still unresolved
    pub fn is_provisional(&self, handle: ItemHandle) -> bool {
        self.provisional.values().any(|h| *h == handle)
    }

    /// Insert a new item under its header path.
    ///
    /// `provisional_owner` is the owning instance ID of an item whose path
    /// is partial. If the path is already taken, the existing handle is
    /// returned and `item` is dropped.
    pub fn insert(&mut self, item: DestroyItem, provisional_owner: Option<&str>) -> ItemHandle {
        let kind = item.kind();
        let key = PathKey::new(kind, item.path());
        if let Some(existing) = self.by_path.get(&key) {
            warn!(path = %key.path, ?kind, "item path already registered");
            return *existing;
        }

        let handle = ItemHandle(self.items.len());
        if let Some(parent) = item.header().parent_child.clone() {
            self.nested.entry(parent).or_default().push(handle);
        }
        if let Some(owner) = provisional_owner {
            self.provisional
                .insert(ProvisionalKey::new(kind, owner, item.name()), handle);
        }
        self.by_path.insert(key, handle);
        self.items.push(item);
        handle
    }

    /// Path an item is stored under.
    ///
    /// A complete path is used as is. A partial path is prefixed with the
    /// owning instance ID so it can never collide with a settled item that
    /// happens to share the same partial path.
    pub fn storage_path(instance_id: &str, resolved: &ResolvedPath) -> String {
        if resolved.complete {
            resolved.path.clone()
        } else {
            format!("{instance_id}{UNRESOLVED_MARKER}{}", resolved.path)
        }
    }

    /// Resolve the item an event refers to.
    ///
    /// Tries the storage path first, then the item previously registered
    /// for the same owning instance and name. An item found the second way
    /// is moved to the new storage path; it stops being provisional once the
    /// path is complete. Repeating the call is a no-op.
    pub fn resolve(
        &mut self,
        kind: ItemKind,
        instance_id: &str,
        name: &str,
        resolved: &ResolvedPath,
    ) -> Option<ItemHandle> {
        let target = Self::storage_path(instance_id, resolved);
        let provisional_key = ProvisionalKey::new(kind, instance_id, name);

        if let Some(handle) = self.find(kind, &target) {
            if resolved.complete {
                if let Some(stray) = self.provisional.remove(&provisional_key) {
                    if stray != handle {
                        self.merge(stray, handle);
                    }
                }
            }
            return Some(handle);
        }

        let handle = self.provisional.get(&provisional_key).copied()?;
        if self.relocate(handle, &target) && resolved.complete {
            self.provisional.remove(&provisional_key);
        }
        Some(handle)
    }

    /// Resolve the item an event refers to, creating it when unknown.
    ///
    /// `make` receives the storage path. Returns the handle and whether the
    /// item was created by this call.
    pub fn resolve_or_insert(
        &mut self,
        kind: ItemKind,
        instance_id: &str,
        name: &str,
        resolved: &ResolvedPath,
        make: impl FnOnce(&str) -> DestroyItem,
    ) -> (ItemHandle, bool) {
        if let Some(handle) = self.resolve(kind, instance_id, name, resolved) {
            return (handle, false);
        }

        let path = Self::storage_path(instance_id, resolved);
        let owner = (!resolved.complete).then_some(instance_id);
        (self.insert(make(&path), owner), true)
    }

    /// Return the item at `path`, creating it with `make` when missing.
    ///
    /// A provisional item of the same name owned by `owner_instance_id` is
    /// adopted and moved to `path`; provisional items of other instances are
    /// never touched. `skipped` is merged into the flag of an existing item.
    pub fn get_or_create(
        &mut self,
        kind: ItemKind,
        path: &str,
        owner_instance_id: Option<&str>,
        name: &str,
        skipped: bool,
        make: impl FnOnce() -> DestroyItem,
    ) -> ItemHandle {
        if let Some(handle) = self.find(kind, path) {
            self.get_mut(handle).header_mut().skipped |= skipped;
            return handle;
        }

        if let Some(handle) = self.find_provisional(kind, owner_instance_id, name) {
            if self.relocate(handle, path) {
                self.provisional.retain(|_, h| *h != handle);
                self.get_mut(handle).header_mut().skipped |= skipped;
                return handle;
            }
        }

        let mut item = make();
        item.header_mut().skipped |= skipped;
        self.insert(item, None)
    }

    /// Re-derive the path of every provisional item.
    ///
    /// Called after a new parent/child edge is learned so items seen before
    /// their owner was announced become reachable from the root. Returns the
    /// number of items moved.
    pub fn promote_provisional(&mut self, paths: &PathBuilder) -> usize {
        let pending: Vec<(ProvisionalKey, ItemHandle)> = self
            .provisional
            .iter()
            .map(|(key, handle)| (key.clone(), *handle))
            .collect();

        let mut moved = 0;
        for (key, handle) in pending {
            let resolved = paths.resolve_item_path(&key.instance_id, &key.name);
            let target = Self::storage_path(&key.instance_id, &resolved);
            let mut live = handle;
            if target != self.get(handle).path() {
                if !self.relocate(handle, &target) {
                    // A pre-created item already owns the resolved path
                    let Some(existing) = self.find(key.kind, &target).filter(|_| resolved.complete)
                    else {
                        continue;
                    };
                    self.merge(handle, existing);
                    live = existing;
                }
                moved += 1;
            }
            if resolved.complete {
                self.provisional.remove(&key);
                if paths.is_root(&key.instance_id) {
                    self.push_root(live);
                }
            }
        }
        moved
    }

    fn find_provisional(
        &self,
        kind: ItemKind,
        owner_instance_id: Option<&str>,
        name: &str,
    ) -> Option<ItemHandle> {
        let owner = owner_instance_id.filter(|id| !id.is_empty())?;
        self.provisional
            .get(&ProvisionalKey::new(kind, owner, name))
            .copied()
    }

    /// Fold a provisional item into the item owning its resolved path.
    ///
    /// `from` leaves every index; lookups through [`canonical`](Self::canonical)
    /// lead to `into` afterwards.
    fn merge(&mut self, from: ItemHandle, into: ItemHandle) {
        let kind = self.get(from).kind();
        let old_path = self.get(from).path().to_string();
        self.by_path.remove(&PathKey::new(kind, &old_path));
        if let Some(parent) = self.get(from).header().parent_child.clone() {
            if let Some(siblings) = self.nested.get_mut(&parent) {
                siblings.retain(|h| *h != from);
            }
        }
        self.provisional.retain(|_, h| *h != from);
        self.roots.retain(|h| *h != from);

        let source = self.items[from.0].clone();
        self.items[into.0].absorb(source);
        self.merged.insert(from, into);
        debug!(from = %old_path, into = %self.get(into).path(), ?kind, "merged provisional item");
    }

    /// Move an item to a new path, keeping every index consistent.
    ///
    /// Returns `false` (and leaves the item where it is) when another item
    /// already owns the target path.
    fn relocate(&mut self, handle: ItemHandle, new_path: &str) -> bool {
        let kind = self.get(handle).kind();
        let old_path = self.get(handle).path().to_string();
        if old_path == new_path {
            return true;
        }

        let new_key = PathKey::new(kind, new_path);
        if self.by_path.contains_key(&new_key) {
            warn!(from = %old_path, to = %new_path, ?kind, "cannot move item onto an occupied path");
            return false;
        }

        self.by_path.remove(&PathKey::new(kind, &old_path));
        if let Some(old_parent) = self.get(handle).header().parent_child.clone() {
            if let Some(siblings) = self.nested.get_mut(&old_parent) {
                siblings.retain(|h| *h != handle);
            }
        }

        self.get_mut(handle).header_mut().relocate(new_path);
        if let Some(new_parent) = self.get(handle).header().parent_child.clone() {
            self.nested.entry(new_parent).or_default().push(handle);
        }
        self.by_path.insert(new_key, handle);

        debug!(from = %old_path, to = %new_path, ?kind, "moved item to resolved path");
        true
    }
}
