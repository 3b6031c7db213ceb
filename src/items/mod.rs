// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Items
//!
//! A destroy item is the client-side view of one element being torn down:
//! a resource, a child blueprint or a link. Items are created either up
//! front from a staged changeset or lazily from the first event that
//! mentions them, and are then updated in place by every later event.
//!
//! ```text
//! DestroyItem
//!   ├── Resource(ResourceItem)
//!   ├── Child(ChildItem)      -- may embed the child's own change document
//!   └── Link(LinkItem)
//! ```
//!
//! - [`registry`] - canonical path-keyed store of every item in a session
//! - [`pre_change`] - builds the initial items from a change document

pub mod pre_change;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::classify::{
    interrupted_child_status, interrupted_link_status, interrupted_resource_status, Classify,
    StatusClass,
};
use crate::domain::{
    split_link_name, BlueprintChanges, InstanceStatus, LinkStatus, PreciseLinkStatus,
    PreciseResourceStatus, ResourceStatus,
};
use crate::events::{
    ChildUpdateMessage, CompletionDurations, LinkUpdateMessage, ResourceUpdateMessage,
};
use crate::paths::{parent_path, path_depth};

pub use pre_change::{child_document, level_entries, populate_from_changes, populate_level, LevelEntry};
pub use registry::{ItemHandle, ItemRegistry};

/// Action planned for an item by the changeset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemAction {
    Create,
    Update,
    #[default]
    Delete,
    Recreate,
    NoChange,
}

/// Kind of element an item tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Resource,
    Child,
    Link,
}

impl ItemKind {
    /// Plural collection name used in result paths (`resources.db`)
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Resource => "resources",
            Self::Child => "children",
            Self::Link => "links",
        }
    }

    /// Singular element type name
    pub fn element_type(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Child => "child",
            Self::Link => "link",
        }
    }
}

/// Fields shared by every item kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemHeader {
    pub name: String,
    pub action: ItemAction,
    /// Slash-joined path of child names ending in the item name
    pub path: String,
    /// Number of child blueprints above the item
    pub depth: usize,
    /// Path of the owning child item, `None` at the root
    pub parent_child: Option<String>,
    /// Never started because the operation ended first
    pub skipped: bool,
    pub failure_reasons: Vec<String>,
}

impl ItemHeader {
    pub fn new(name: impl Into<String>, action: ItemAction, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            action,
            depth: path_depth(&path),
            parent_child: parent_path(&path).map(str::to_string),
            path,
            skipped: false,
            failure_reasons: Vec::new(),
        }
    }

    /// Move the header to a new path, recomputing depth and parent
    pub(crate) fn relocate(&mut self, path: &str) {
        self.path = path.to_string();
        self.depth = path_depth(path);
        self.parent_child = parent_path(path).map(str::to_string);
    }
}

/// Resource being destroyed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceItem {
    pub header: ItemHeader,
    pub resource_id: String,
    pub resource_type: String,
    pub group: u32,
    pub status: ResourceStatus,
    pub precise_status: PreciseResourceStatus,
    pub attempt: u32,
    pub can_retry: bool,
    pub durations: Option<CompletionDurations>,
    pub updated_at: i64,
}

impl ResourceItem {
    pub fn new(header: ItemHeader) -> Self {
        Self {
            header,
            resource_id: String::new(),
            resource_type: String::new(),
            group: 0,
            status: ResourceStatus::Unknown,
            precise_status: PreciseResourceStatus::Unknown,
            attempt: 0,
            can_retry: false,
            durations: None,
            updated_at: 0,
        }
    }

    /// Copy every mutable field reported by an event
    pub fn apply(&mut self, update: &ResourceUpdateMessage) {
        if !update.resource_id.is_empty() {
            self.resource_id = update.resource_id.clone();
        }
        self.group = update.group;
        self.status = update.status;
        self.precise_status = update.precise_status;
        self.header.failure_reasons = update.failure_reasons.clone();
        self.attempt = update.attempt;
        self.can_retry = update.can_retry;
        self.durations = update.durations.clone();
        self.updated_at = update.update_timestamp;
    }
}

/// Child blueprint being destroyed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildItem {
    pub header: ItemHeader,
    pub parent_instance_id: String,
    pub child_instance_id: String,
    pub group: u32,
    pub status: InstanceStatus,
    pub durations: Option<CompletionDurations>,
    pub updated_at: i64,
    /// Change document for the child's contents, used for drill-down
    pub changes: Option<BlueprintChanges>,
}

impl ChildItem {
    pub fn new(header: ItemHeader) -> Self {
        Self {
            header,
            parent_instance_id: String::new(),
            child_instance_id: String::new(),
            group: 0,
            status: InstanceStatus::Unknown,
            durations: None,
            updated_at: 0,
            changes: None,
        }
    }

    pub fn with_changes(mut self, changes: Option<BlueprintChanges>) -> Self {
        self.changes = changes;
        self
    }

    pub fn apply(&mut self, update: &ChildUpdateMessage) {
        self.parent_instance_id = update.parent_instance_id.clone();
        self.child_instance_id = update.child_instance_id.clone();
        self.group = update.group;
        self.status = update.status;
        self.header.failure_reasons = update.failure_reasons.clone();
        self.durations = update.durations.clone();
        self.updated_at = update.update_timestamp;
    }
}

/// Link being destroyed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkItem {
    pub header: ItemHeader,
    pub link_id: String,
    pub resource_a: String,
    pub resource_b: String,
    pub status: LinkStatus,
    pub precise_status: PreciseLinkStatus,
    pub current_stage_attempt: u32,
    pub can_retry_current_stage: bool,
    pub durations: Option<CompletionDurations>,
    pub updated_at: i64,
}

impl LinkItem {
    /// Endpoint resource names are derived from the link name
    pub fn new(header: ItemHeader) -> Self {
        let (resource_a, resource_b) = split_link_name(&header.name);
        Self {
            header,
            link_id: String::new(),
            resource_a,
            resource_b,
            status: LinkStatus::Unknown,
            precise_status: PreciseLinkStatus::Unknown,
            current_stage_attempt: 0,
            can_retry_current_stage: false,
            durations: None,
            updated_at: 0,
        }
    }

    pub fn apply(&mut self, update: &LinkUpdateMessage) {
        if !update.link_id.is_empty() {
            self.link_id = update.link_id.clone();
        }
        self.status = update.status;
        self.precise_status = update.precise_status;
        self.header.failure_reasons = update.failure_reasons.clone();
        self.current_stage_attempt = update.current_stage_attempt;
        self.can_retry_current_stage = update.can_retry_current_stage;
        self.durations = update.durations.clone();
        self.updated_at = update.update_timestamp;
    }
}

/// One element of a destroy operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestroyItem {
    Resource(ResourceItem),
    Child(ChildItem),
    Link(LinkItem),
}

impl DestroyItem {
    pub fn resource(header: ItemHeader) -> Self {
        Self::Resource(ResourceItem::new(header))
    }

    pub fn child(header: ItemHeader) -> Self {
        Self::Child(ChildItem::new(header))
    }

    pub fn link(header: ItemHeader) -> Self {
        Self::Link(LinkItem::new(header))
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Resource(_) => ItemKind::Resource,
            Self::Child(_) => ItemKind::Child,
            Self::Link(_) => ItemKind::Link,
        }
    }

    pub fn header(&self) -> &ItemHeader {
        match self {
            Self::Resource(item) => &item.header,
            Self::Child(item) => &item.header,
            Self::Link(item) => &item.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ItemHeader {
        match self {
            Self::Resource(item) => &mut item.header,
            Self::Child(item) => &mut item.header,
            Self::Link(item) => &mut item.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn path(&self) -> &str {
        &self.header().path
    }

    pub fn action(&self) -> ItemAction {
        self.header().action
    }

    pub fn is_skipped(&self) -> bool {
        self.header().skipped
    }

    pub fn failure_reasons(&self) -> &[String] {
        &self.header().failure_reasons
    }

    /// Lifecycle class of the item's current status
    pub fn class(&self) -> StatusClass {
        match self {
            Self::Resource(item) => item.status.class(),
            Self::Child(item) => item.status.class(),
            Self::Link(item) => item.status.class(),
        }
    }

    /// Human readable label of the current coarse status
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Resource(item) => item.status.label(),
            Self::Child(item) => item.status.label(),
            Self::Link(item) => item.status.label(),
        }
    }

    /// Force the kind-specific interrupted status
    pub fn mark_interrupted(&mut self) {
        match self {
            Self::Resource(item) => {
                let (status, precise) = interrupted_resource_status();
                item.status = status;
                item.precise_status = precise;
            }
            Self::Child(item) => {
                item.status = interrupted_child_status();
            }
            Self::Link(item) => {
                let (status, precise) = interrupted_link_status(item.precise_status);
                item.status = status;
                item.precise_status = precise;
            }
        }
    }

    pub fn as_child(&self) -> Option<&ChildItem> {
        match self {
            Self::Child(item) => Some(item),
            _ => None,
        }
    }

    /// Take over the progress recorded on another copy of the same element.
    ///
    /// Placement (path, action, skipped flag) stays with `self`; status,
    /// failure reasons and timing come from `other`. Kinds must match.
    pub(crate) fn absorb(&mut self, other: DestroyItem) {
        let header = self.header().clone();
        let reasons = other.failure_reasons().to_vec();
        let (resource_id, resource_type, changes) = match &*self {
            Self::Resource(item) => (item.resource_id.clone(), item.resource_type.clone(), None),
            Self::Child(item) => (String::new(), String::new(), item.changes.clone()),
            Self::Link(_) => (String::new(), String::new(), None),
        };
        if other.kind() != self.kind() {
            return;
        }

        *self = other;
        *self.header_mut() = ItemHeader {
            failure_reasons: reasons,
            ..header
        };
        match self {
            Self::Resource(item) => {
                if item.resource_id.is_empty() {
                    item.resource_id = resource_id;
                }
                if item.resource_type.is_empty() {
                    item.resource_type = resource_type;
                }
            }
            Self::Child(item) => {
                if changes.is_some() {
                    item.changes = changes;
                }
            }
            Self::Link(_) => {}
        }
    }
}
