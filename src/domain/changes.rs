// Copyright (c) 2025 - Cowboy AI, Inc.
//! Staged Change Documents
//!
//! A changeset is produced by the engine's change-staging pass before an
//! operation runs. For destroy, it is dominated by `removed_*` entries; a
//! selective destroy may also list resources, links and children under the
//! `*_changes` buckets.
//!
//! The shape is recursive: every child blueprint carries its own
//! [`BlueprintChanges`] under `child_changes`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between the two resource names of a link (`resourceA::resourceB`)
pub const LINK_NAME_SEPARATOR: &str = "::";

/// Build the canonical link name for two resources
pub fn link_name(resource_a: &str, resource_b: &str) -> String {
    format!("{resource_a}{LINK_NAME_SEPARATOR}{resource_b}")
}

/// Split a link name into its two endpoint resource names.
///
/// A name without the separator yields the whole name as resource A and an
/// empty resource B.
pub fn split_link_name(name: &str) -> (String, String) {
    match name.split_once(LINK_NAME_SEPARATOR) {
        Some((a, b)) => (a.to_string(), b.to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Changeset record returned by the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    pub id: String,
    #[serde(default)]
    pub instance_id: String,
    /// `true` when the changeset was staged for a destroy operation
    #[serde(default)]
    pub destroy: bool,
    #[serde(default)]
    pub changes: Option<BlueprintChanges>,
}

/// Changes to apply to one blueprint level
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlueprintChanges {
    pub new_resources: BTreeMap<String, Value>,
    pub resource_changes: BTreeMap<String, ResourceChanges>,
    pub removed_resources: Vec<String>,
    pub removed_links: Vec<String>,
    pub new_children: BTreeMap<String, NewBlueprintDefinition>,
    pub child_changes: BTreeMap<String, BlueprintChanges>,
    pub recreate_children: Vec<String>,
    pub removed_children: Vec<String>,
}

impl BlueprintChanges {
    /// `true` when nothing would change at this level or below
    pub fn is_empty(&self) -> bool {
        self.new_resources.is_empty()
            && self.resource_changes.is_empty()
            && self.removed_resources.is_empty()
            && self.removed_links.is_empty()
            && self.new_children.is_empty()
            && self.child_changes.is_empty()
            && self.recreate_children.is_empty()
            && self.removed_children.is_empty()
    }

    /// Links listed as changed through the outbound link changes of a
    /// changed resource, by full link name.
    pub fn changed_links(&self) -> Vec<String> {
        self.resource_changes
            .iter()
            .flat_map(|(resource, changes)| {
                changes
                    .outbound_link_changes
                    .keys()
                    .map(move |target| link_name(resource, target))
            })
            .collect()
    }

    /// Nested change document for a child, from either the new-children or
    /// the child-changes bucket.
    pub fn nested_changes_for(&self, child_name: &str) -> Option<BlueprintChanges> {
        if let Some(definition) = self.new_children.get(child_name) {
            return Some(definition.to_changes());
        }
        self.child_changes.get(child_name).cloned()
    }
}

/// Field-level changes for a single resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceChanges {
    pub modified_fields: Vec<FieldChange>,
    pub new_fields: Vec<FieldChange>,
    pub removed_fields: Vec<String>,
    pub must_recreate: bool,
    /// Changed outbound links keyed by the target resource name
    pub outbound_link_changes: BTreeMap<String, LinkChanges>,
    pub removed_outbound_links: Vec<String>,
}

/// Field-level changes for a single link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkChanges {
    pub modified_fields: Vec<FieldChange>,
    pub new_fields: Vec<FieldChange>,
    pub removed_fields: Vec<String>,
}

/// A single field change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_path: String,
    #[serde(default)]
    pub prev_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

/// Definition of a child blueprint that does not exist yet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBlueprintDefinition {
    pub new_resources: BTreeMap<String, Value>,
    pub new_children: BTreeMap<String, NewBlueprintDefinition>,
}

impl NewBlueprintDefinition {
    /// View the definition as a change document
    pub fn to_changes(&self) -> BlueprintChanges {
        BlueprintChanges {
            new_resources: self.new_resources.clone(),
            new_children: self.new_children.clone(),
            ..Default::default()
        }
    }
}
