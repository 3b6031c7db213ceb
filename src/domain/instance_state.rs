// Copyright (c) 2025 - Cowboy AI, Inc.
//! Blueprint Instance State Snapshots
//!
//! Read-only snapshots of a deployed blueprint instance as recorded by the
//! engine. The destroy session fetches one before the operation starts (to
//! fill in resource types and child contents) and one after it finishes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::changes::BlueprintChanges;
use super::status::{InstanceStatus, LinkStatus, PreciseLinkStatus, PreciseResourceStatus, ResourceStatus};

/// Recorded state of a blueprint instance and everything nested in it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlueprintInstanceState {
    pub instance_id: String,
    pub instance_name: String,
    pub status: InstanceStatus,
    /// Resource IDs keyed by resource name
    pub resource_ids: BTreeMap<String, String>,
    /// Resources keyed by resource ID
    pub resources: BTreeMap<String, ResourceState>,
    /// Links keyed by link name
    pub links: BTreeMap<String, LinkState>,
    /// Child blueprint instances keyed by child name
    pub child_blueprints: BTreeMap<String, BlueprintInstanceState>,
}

/// Recorded state of a single resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceState {
    #[serde(rename = "id")]
    pub resource_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub status: ResourceStatus,
    pub precise_status: PreciseResourceStatus,
    pub failure_reasons: Vec<String>,
    pub spec_data: Option<Value>,
}

/// Recorded state of a single link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkState {
    #[serde(rename = "id")]
    pub link_id: String,
    pub name: String,
    pub status: LinkStatus,
    pub precise_status: PreciseLinkStatus,
}

impl BlueprintInstanceState {
    /// Look up a resource by name through the name → ID index
    pub fn resource_by_name(&self, name: &str) -> Option<&ResourceState> {
        self.resource_ids
            .get(name)
            .and_then(|id| self.resources.get(id))
    }

    /// Find this instance or a nested child instance by instance ID
    pub fn find_instance(&self, instance_id: &str) -> Option<&BlueprintInstanceState> {
        if self.instance_id == instance_id {
            return Some(self);
        }
        self.child_blueprints
            .values()
            .find_map(|child| child.find_instance(instance_id))
    }

    /// Snapshot of a direct child blueprint by name
    pub fn child(&self, name: &str) -> Option<&BlueprintInstanceState> {
        self.child_blueprints.get(name)
    }

    /// Change document that removes everything at this level.
    ///
    /// Used for whole-subtree removals, where no explicit diff exists but the
    /// contents of the child still need to be addressable.
    pub fn removal_changes(&self) -> BlueprintChanges {
        BlueprintChanges {
            removed_resources: self.resource_ids.keys().cloned().collect(),
            removed_links: self.links.keys().cloned().collect(),
            removed_children: self.child_blueprints.keys().cloned().collect(),
            ..Default::default()
        }
    }
}
