// Copyright (c) 2025 - Cowboy AI, Inc.
//! Drift Reconciliation Coordinator
//!
//! A destroy request can be refused because the engine found resources or
//! links whose real state differs from what it recorded. The coordinator
//! keeps the refusal, exposes it as a tree for display and, once the
//! operator approves, turns it into an "accept external state" request.
//!
//! ```text
//! DriftBlocked error ──block()──> Blocked ──approve()──> Reconciling
//!                                                │
//!                     applied() ─────────────────┤
//!          (adopt blocked changeset, restart)    │
//!                                                └── apply_failed()
//! ```

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    ApplyReconciliationPayload, IntermediaryReconcileAction, LinkReconcileAction,
    LinkReconcileResult, ReconcileAction, ReconciliationCheckResult, ResourceReconcileAction,
    ResourceReconcileResult,
};
use crate::state_machine::{DriftInput, DriftPhase, StateMachine, TransitionResult};

/// Status sent for every intermediary resource of a reconciled link.
///
/// Intermediaries carry no status of their own in a reconciliation result,
/// so they are reported with the "created" resource status code.
pub const INTERMEDIARY_PLACEHOLDER_STATUS: &str = "2";

/// Separator between the names of nested children in a `child_path`
pub const CHILD_PATH_SEPARATOR: char = '.';

/// Build the reconciliation request for a check result.
///
/// One action per resource and per link, plus one intermediary action per
/// intermediary change of each link.
pub fn build_payload(result: &ReconciliationCheckResult) -> ApplyReconciliationPayload {
    let resource_actions = result
        .resources
        .iter()
        .map(|resource| ResourceReconcileAction {
            resource_id: resource.resource_id.clone(),
            child_path: resource.child_path.clone(),
            action: resource.recommended_action.as_str().to_string(),
            external_state: resource.external_state.clone(),
            new_status: resource.new_status.code().to_string(),
        })
        .collect();

    let link_actions = result
        .links
        .iter()
        .map(|link| LinkReconcileAction {
            link_id: link.link_id.clone(),
            child_path: link.child_path.clone(),
            action: link.recommended_action.as_str().to_string(),
            new_status: link.new_status.code().to_string(),
            link_data_updates: link.link_data_updates.clone(),
            intermediary_actions: link
                .intermediary_changes
                .iter()
                .map(|(name, change)| {
                    (
                        name.clone(),
                        IntermediaryReconcileAction {
                            action: ReconcileAction::AcceptExternal.as_str().to_string(),
                            external_state: change.external_state.clone(),
                            new_status: INTERMEDIARY_PLACEHOLDER_STATUS.to_string(),
                        },
                    )
                })
                .collect(),
        })
        .collect();

    ApplyReconciliationPayload {
        resource_actions,
        link_actions,
    }
}

/// Reconciliation entries grouped by the child blueprint they belong to
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriftNode {
    /// Child name, empty for the root
    pub name: String,
    /// Dot-separated child path, empty for the root
    pub child_path: String,
    pub resources: Vec<ResourceReconcileResult>,
    pub links: Vec<LinkReconcileResult>,
    pub children: Vec<DriftNode>,
}

impl DriftNode {
    fn child_mut(&mut self, name: &str) -> &mut DriftNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                let child_path = if self.child_path.is_empty() {
                    name.to_string()
                } else {
                    format!("{}{CHILD_PATH_SEPARATOR}{name}", self.child_path)
                };
                self.children.push(DriftNode {
                    name: name.to_string(),
                    child_path,
                    ..Default::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn node_mut(&mut self, child_path: &str) -> &mut DriftNode {
        child_path
            .split(CHILD_PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .fold(self, |node, segment| node.child_mut(segment))
    }

    /// Total number of entries in this node and below
    pub fn entry_count(&self) -> usize {
        self.resources.len()
            + self.links.len()
            + self.children.iter().map(DriftNode::entry_count).sum::<usize>()
    }
}

/// Display tree of a reconciliation check result
pub fn build_display_tree(result: &ReconciliationCheckResult) -> DriftNode {
    let mut root = DriftNode::default();
    for resource in &result.resources {
        root.node_mut(&resource.child_path)
            .resources
            .push(resource.clone());
    }
    for link in &result.links {
        root.node_mut(&link.child_path).links.push(link.clone());
    }
    root
}

/// Read-only view of a drift block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftView {
    pub phase: DriftPhase,
    pub message: String,
    pub blocked_changeset_id: String,
    pub tree: DriftNode,
}

#[derive(Debug, Clone, PartialEq)]
struct DriftBlock {
    message: String,
    changeset_id: String,
    result: ReconciliationCheckResult,
    tree: DriftNode,
}

/// Holds a drift block through approval and reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftCoordinator {
    phase: DriftPhase,
    block: Option<DriftBlock>,
}

impl DriftCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DriftPhase {
        self.phase
    }

    pub fn is_blocked(&self) -> bool {
        self.phase == DriftPhase::Blocked
    }

    pub fn message(&self) -> Option<&str> {
        self.block.as_ref().map(|b| b.message.as_str())
    }

    pub fn result(&self) -> Option<&ReconciliationCheckResult> {
        self.block.as_ref().map(|b| &b.result)
    }

    pub fn blocked_changeset_id(&self) -> Option<&str> {
        self.block.as_ref().map(|b| b.changeset_id.as_str())
    }

    pub fn tree(&self) -> Option<&DriftNode> {
        self.block.as_ref().map(|b| &b.tree)
    }

    pub fn view(&self) -> Option<DriftView> {
        self.block.as_ref().map(|block| DriftView {
            phase: self.phase,
            message: block.message.clone(),
            blocked_changeset_id: block.changeset_id.clone(),
            tree: block.tree.clone(),
        })
    }

    /// Record a drift refusal
    pub fn block(
        &mut self,
        message: impl Into<String>,
        changeset_id: impl Into<String>,
        result: ReconciliationCheckResult,
    ) -> TransitionResult<()> {
        let (phase, _) = self.phase.transition(&DriftInput::Block)?;
        let tree = build_display_tree(&result);
        let block = DriftBlock {
            message: message.into(),
            changeset_id: changeset_id.into(),
            result,
            tree,
        };
        info!(
            resources = block.result.resources.len(),
            links = block.result.links.len(),
            changeset_id = %block.changeset_id,
            "destroy blocked by drift"
        );
        self.phase = phase;
        self.block = Some(block);
        Ok(())
    }

    /// Operator approved; returns the request to send
    pub fn approve(&mut self) -> TransitionResult<ApplyReconciliationPayload> {
        let (phase, _) = self.phase.transition(&DriftInput::Approve)?;
        let payload = self
            .block
            .as_ref()
            .map(|block| build_payload(&block.result))
            .unwrap_or_default();
        self.phase = phase;
        Ok(payload)
    }

    /// Reconciliation succeeded: clear the block and return the changeset
    /// ID the destroy should resume with
    pub fn applied(&mut self) -> TransitionResult<Option<String>> {
        let (phase, _) = self.phase.transition(&DriftInput::Applied)?;
        self.phase = phase;
        Ok(self
            .block
            .take()
            .map(|block| block.changeset_id)
            .filter(|id| !id.is_empty()))
    }

    /// Reconciliation request failed; the block stays for display
    pub fn apply_failed(&mut self) -> TransitionResult<()> {
        let (phase, _) = self.phase.transition(&DriftInput::ApplyFailed)?;
        warn!("reconciliation failed, destroy stays blocked");
        self.phase = phase;
        Ok(())
    }
}
