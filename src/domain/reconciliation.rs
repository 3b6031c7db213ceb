// Copyright (c) 2025 - Cowboy AI, Inc.
//! Drift Reconciliation Types
//!
//! The engine refuses to destroy an instance whose recorded state has drifted
//! from the real external state. It reports a [`ReconciliationCheckResult`]
//! describing every drifted (or interrupted) resource and link along with the
//! action it recommends. An operator accepts that result by submitting an
//! [`ApplyReconciliationPayload`] built from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::status::{LinkStatus, ResourceStatus};

/// Why an element needs reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationType {
    #[default]
    Drift,
    Interrupted,
}

/// Action the engine recommends (and the operator submits) for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Adopt the externally observed state as the recorded state
    #[default]
    AcceptExternal,
    /// Keep the recorded state but update the status
    UpdateStatus,
    /// Mark the element as failed
    MarkFailed,
}

impl ReconcileAction {
    /// Wire representation used in reconciliation payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptExternal => "accept_external",
            Self::UpdateStatus => "update_status",
            Self::MarkFailed => "mark_failed",
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the engine's drift / interruption check for an instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationCheckResult {
    pub instance_id: String,
    pub resources: Vec<ResourceReconcileResult>,
    pub links: Vec<LinkReconcileResult>,
    pub has_interrupted: bool,
    pub has_drift: bool,
}

impl ReconciliationCheckResult {
    /// `true` when nothing needs reconciling
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.links.is_empty()
    }
}

/// Reconciliation entry for a single resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceReconcileResult {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    /// Dot-separated path of child names owning the resource; empty at the root
    pub child_path: String,
    #[serde(rename = "type")]
    pub reconciliation_type: ReconciliationType,
    pub old_status: ResourceStatus,
    pub new_status: ResourceStatus,
    pub resource_exists: bool,
    pub external_state: Option<Value>,
    pub persisted_state: Option<Value>,
    pub recommended_action: ReconcileAction,
}

/// Reconciliation entry for a single link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkReconcileResult {
    pub link_id: String,
    pub link_name: String,
    pub child_path: String,
    #[serde(rename = "type")]
    pub reconciliation_type: ReconciliationType,
    pub old_status: LinkStatus,
    pub new_status: LinkStatus,
    pub link_data_updates: BTreeMap<String, Value>,
    /// Intermediary resources owned by the link, keyed by name
    pub intermediary_changes: BTreeMap<String, IntermediaryReconcileResult>,
    pub recommended_action: ReconcileAction,
}

/// Reconciliation entry for an intermediary resource managed by a link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntermediaryReconcileResult {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub exists: bool,
    pub external_state: Option<Value>,
    pub persisted_state: Option<Value>,
}

/// Payload accepted by the engine's apply-reconciliation endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReconciliationPayload {
    pub resource_actions: Vec<ResourceReconcileAction>,
    pub link_actions: Vec<LinkReconcileAction>,
}

/// Operator decision for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReconcileAction {
    pub resource_id: String,
    pub child_path: String,
    pub action: String,
    #[serde(default)]
    pub external_state: Option<Value>,
    /// Target status code rendered as a decimal string
    pub new_status: String,
}

/// Operator decision for one link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReconcileAction {
    pub link_id: String,
    pub child_path: String,
    pub action: String,
    pub new_status: String,
    #[serde(default)]
    pub link_data_updates: BTreeMap<String, Value>,
    #[serde(default)]
    pub intermediary_actions: BTreeMap<String, IntermediaryReconcileAction>,
}

/// Operator decision for one intermediary resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediaryReconcileAction {
    pub action: String,
    #[serde(default)]
    pub external_state: Option<Value>,
    pub new_status: String,
}
