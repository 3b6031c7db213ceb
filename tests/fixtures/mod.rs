// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for blueprint-destroy
//!
//! Deterministic events, change documents and snapshots, plus a scripted
//! in-memory engine for driving whole sessions.
//!
//! # Design Principles
//! - Instance IDs, event IDs and timestamps are fixed constants
//! - Fixtures are the only place that constructs engine events
//! - The scripted engine records every request it receives

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use blueprint_destroy::domain::{
    ApplyReconciliationPayload, BlueprintChanges, BlueprintInstanceState, Changeset,
    InstanceStatus, IntermediaryReconcileResult, LinkReconcileResult, LinkStatus,
    ReconcileAction, ReconciliationCheckResult, ResourceReconcileResult, ResourceState,
    ResourceStatus,
};
use blueprint_destroy::engine::{DestroyInstancePayload, DestroyStartResponse, EngineClient};
use blueprint_destroy::errors::{EngineError, EngineResult};
use blueprint_destroy::events::{
    BlueprintInstanceEvent, ChildUpdateMessage, DestroyEvent, FinishMessage,
    InstanceUpdateMessage, LinkUpdateMessage, ResourceUpdateMessage, StreamFailure,
};

pub const ROOT_INSTANCE_ID: &str = "01934f4a-1000-7000-8000-000000001000";
pub const CHILD_INSTANCE_ID: &str = "01934f4a-1001-7000-8000-000000001001";
pub const GRANDCHILD_INSTANCE_ID: &str = "01934f4a-1002-7000-8000-000000001002";

pub const CHANGESET_ID: &str = "01934f4a-c001-7000-8000-00000000c001";
pub const RECONCILED_CHANGESET_ID: &str = "01934f4a-c002-7000-8000-00000000c002";

/// Resume cursor returned by the scripted engine unless a fresh stream is requested
pub const RESUME_CURSOR: &str = "01934f4a-0000-7000-8000-000000000000";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";
pub const FIXED_UNIX: i64 = 1_768_824_000;

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Deterministic event ID for the n-th event of a stream
pub fn event_id(n: u32) -> String {
    format!("01934f4a-{n:04x}-7000-8000-{n:012x}")
}

// ============================================================================
// Events
// ============================================================================

pub fn resource_event(
    n: u32,
    instance_id: &str,
    name: &str,
    status: ResourceStatus,
    reasons: &[&str],
) -> BlueprintInstanceEvent {
    BlueprintInstanceEvent::new(
        event_id(n),
        DestroyEvent::ResourceUpdate(ResourceUpdateMessage {
            instance_id: instance_id.to_string(),
            resource_id: format!("res-{name}"),
            resource_name: name.to_string(),
            status,
            failure_reasons: reasons.iter().map(|r| r.to_string()).collect(),
            update_timestamp: FIXED_UNIX + n as i64,
            ..Default::default()
        }),
    )
}

pub fn child_event(
    n: u32,
    parent_instance_id: &str,
    child_instance_id: &str,
    name: &str,
    status: InstanceStatus,
) -> BlueprintInstanceEvent {
    BlueprintInstanceEvent::new(
        event_id(n),
        DestroyEvent::ChildUpdate(ChildUpdateMessage {
            parent_instance_id: parent_instance_id.to_string(),
            child_instance_id: child_instance_id.to_string(),
            child_name: name.to_string(),
            status,
            update_timestamp: FIXED_UNIX + n as i64,
            ..Default::default()
        }),
    )
}

pub fn link_event(
    n: u32,
    instance_id: &str,
    name: &str,
    status: LinkStatus,
) -> BlueprintInstanceEvent {
    BlueprintInstanceEvent::new(
        event_id(n),
        DestroyEvent::LinkUpdate(LinkUpdateMessage {
            instance_id: instance_id.to_string(),
            link_id: format!("link-{name}"),
            link_name: name.to_string(),
            status,
            update_timestamp: FIXED_UNIX + n as i64,
            ..Default::default()
        }),
    )
}

pub fn instance_event(n: u32, instance_id: &str, status: InstanceStatus) -> BlueprintInstanceEvent {
    BlueprintInstanceEvent::new(
        event_id(n),
        DestroyEvent::InstanceUpdate(InstanceUpdateMessage {
            instance_id: instance_id.to_string(),
            status,
            update_timestamp: FIXED_UNIX + n as i64,
        }),
    )
}

pub fn finish_event(n: u32, status: InstanceStatus, reasons: &[&str]) -> BlueprintInstanceEvent {
    BlueprintInstanceEvent::new(
        event_id(n),
        DestroyEvent::Finish(FinishMessage {
            instance_id: ROOT_INSTANCE_ID.to_string(),
            status,
            failure_reasons: reasons.iter().map(|r| r.to_string()).collect(),
            finish_timestamp: FIXED_UNIX + n as i64,
            update_timestamp: FIXED_UNIX + n as i64,
            end_of_stream: true,
            ..Default::default()
        }),
    )
}

// ============================================================================
// Change documents and snapshots
// ============================================================================

/// Top-level removal of the given resources
pub fn removal_changes(resources: &[&str]) -> BlueprintChanges {
    BlueprintChanges {
        removed_resources: resources.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    }
}

pub fn snapshot_with_resources(instance_id: &str, resources: &[&str]) -> BlueprintInstanceState {
    let mut state = BlueprintInstanceState {
        instance_id: instance_id.to_string(),
        ..Default::default()
    };
    for name in resources {
        state.resources.insert(
            format!("res-{name}"),
            ResourceState {
                resource_id: format!("res-{name}"),
                name: name.to_string(),
                resource_type: "aws/dynamodb/table".to_string(),
                ..Default::default()
            },
        );
        state
            .resource_ids
            .insert(name.to_string(), format!("res-{name}"));
    }
    state
}

pub fn changeset(changes: BlueprintChanges) -> Changeset {
    Changeset {
        id: CHANGESET_ID.to_string(),
        instance_id: ROOT_INSTANCE_ID.to_string(),
        destroy: true,
        changes: Some(changes),
    }
}

/// Drift check with a single drifted resource
pub fn single_resource_drift() -> ReconciliationCheckResult {
    ReconciliationCheckResult {
        instance_id: ROOT_INSTANCE_ID.to_string(),
        resources: vec![ResourceReconcileResult {
            resource_id: "res-db".to_string(),
            resource_name: "db".to_string(),
            resource_type: "aws/dynamodb/table".to_string(),
            old_status: ResourceStatus::Created,
            new_status: ResourceStatus::Created,
            resource_exists: true,
            recommended_action: ReconcileAction::AcceptExternal,
            ..Default::default()
        }],
        has_drift: true,
        ..Default::default()
    }
}

/// Drift check with resources, links and intermediaries across levels
pub fn nested_drift() -> ReconciliationCheckResult {
    let mut intermediaries = BTreeMap::new();
    for name in ["role", "policy"] {
        intermediaries.insert(
            name.to_string(),
            IntermediaryReconcileResult {
                name: name.to_string(),
                resource_type: "aws/iam/role".to_string(),
                exists: true,
                ..Default::default()
            },
        );
    }
    ReconciliationCheckResult {
        instance_id: ROOT_INSTANCE_ID.to_string(),
        resources: vec![
            ResourceReconcileResult {
                resource_id: "res-db".to_string(),
                resource_name: "db".to_string(),
                recommended_action: ReconcileAction::AcceptExternal,
                ..Default::default()
            },
            ResourceReconcileResult {
                resource_id: "res-queue".to_string(),
                resource_name: "queue".to_string(),
                child_path: "network.core".to_string(),
                recommended_action: ReconcileAction::UpdateStatus,
                ..Default::default()
            },
        ],
        links: vec![LinkReconcileResult {
            link_id: "link-fn-db".to_string(),
            link_name: "fn::db".to_string(),
            intermediary_changes: intermediaries,
            recommended_action: ReconcileAction::AcceptExternal,
            ..Default::default()
        }],
        has_drift: true,
        ..Default::default()
    }
}

// ============================================================================
// Scripted engine
// ============================================================================

/// In-memory engine answering from a script
#[derive(Default)]
pub struct ScriptedEngine {
    destroy_responses: Mutex<VecDeque<EngineResult<DestroyStartResponse>>>,
    events: Vec<BlueprintInstanceEvent>,
    stream_failure: Option<StreamFailure>,
    hold_stream_open: bool,
    fresh_stream: bool,
    pre_destroy: Option<BlueprintInstanceState>,
    changeset: Option<Changeset>,
    reconciliation_error: Option<EngineError>,

    pub destroy_calls: Mutex<Vec<DestroyInstancePayload>>,
    pub reconciliation_calls: Mutex<Vec<ApplyReconciliationPayload>>,
    pub state_fetches: Mutex<usize>,
    pub changeset_fetches: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered on every stream
    pub fn with_events(mut self, events: Vec<BlueprintInstanceEvent>) -> Self {
        self.events = events;
        self
    }

    /// Queue a response for the next destroy request
    pub fn with_destroy_response(self, response: EngineResult<DestroyStartResponse>) -> Self {
        self.destroy_responses
            .lock()
            .expect("destroy responses lock")
            .push_back(response);
        self
    }

    pub fn with_drift_block(self, changeset_id: &str, result: ReconciliationCheckResult) -> Self {
        self.with_destroy_response(Err(EngineError::DriftBlocked {
            message: "Drift detected".to_string(),
            changeset_id: changeset_id.to_string(),
            reconciliation: Box::new(result),
        }))
    }

    /// Report a failure on the error channel after the events. The
    /// delivery task then exits and closes both channels unless
    /// [`holding_stream_open`](Self::holding_stream_open) is set.
    pub fn with_stream_failure(self, message: &str) -> Self {
        self.with_stream_failure_report(StreamFailure {
            message: message.to_string(),
            diagnostics: Vec::new(),
        })
    }

    pub fn with_stream_failure_report(mut self, failure: StreamFailure) -> Self {
        self.stream_failure = Some(failure);
        self
    }

    /// Keep the event channel open after the scripted events
    pub fn holding_stream_open(mut self) -> Self {
        self.hold_stream_open = true;
        self
    }

    /// Accept destroys without a resume cursor
    pub fn fresh_stream(mut self) -> Self {
        self.fresh_stream = true;
        self
    }

    pub fn with_pre_destroy_state(mut self, state: BlueprintInstanceState) -> Self {
        self.pre_destroy = Some(state);
        self
    }

    pub fn with_changeset(mut self, changeset: Changeset) -> Self {
        self.changeset = Some(changeset);
        self
    }

    pub fn failing_reconciliation(mut self, message: &str) -> Self {
        self.reconciliation_error = Some(EngineError::Request(message.to_string()));
        self
    }

    pub fn destroy_calls(&self) -> Vec<DestroyInstancePayload> {
        self.destroy_calls.lock().expect("destroy calls lock").clone()
    }

    pub fn reconciliation_calls(&self) -> Vec<ApplyReconciliationPayload> {
        self.reconciliation_calls
            .lock()
            .expect("reconciliation calls lock")
            .clone()
    }
}

#[async_trait]
impl EngineClient for ScriptedEngine {
    async fn destroy_blueprint_instance(
        &self,
        _instance: &str,
        payload: DestroyInstancePayload,
    ) -> EngineResult<DestroyStartResponse> {
        self.destroy_calls
            .lock()
            .expect("destroy calls lock")
            .push(payload);
        let scripted = self
            .destroy_responses
            .lock()
            .expect("destroy responses lock")
            .pop_front();
        scripted.unwrap_or_else(|| {
            Ok(DestroyStartResponse {
                instance_id: ROOT_INSTANCE_ID.to_string(),
                last_event_id: if self.fresh_stream {
                    String::new()
                } else {
                    RESUME_CURSOR.to_string()
                },
            })
        })
    }

    async fn stream_blueprint_instance_events(
        &self,
        _instance_id: &str,
        _last_event_id: Option<&str>,
        events: mpsc::Sender<BlueprintInstanceEvent>,
        errors: mpsc::Sender<StreamFailure>,
    ) -> EngineResult<()> {
        let scripted = self.events.clone();
        let failure = self.stream_failure.clone();
        let hold_open = self.hold_stream_open;
        tokio::spawn(async move {
            for event in scripted {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            if let Some(failure) = failure {
                let _ = errors.send(failure).await;
            }
            if hold_open {
                events.closed().await;
            }
        });
        Ok(())
    }

    async fn get_blueprint_instance_state(
        &self,
        _instance: &str,
    ) -> EngineResult<Option<BlueprintInstanceState>> {
        *self.state_fetches.lock().expect("state fetches lock") += 1;
        Ok(self.pre_destroy.clone())
    }

    async fn get_changeset(&self, changeset_id: &str) -> EngineResult<Option<Changeset>> {
        self.changeset_fetches
            .lock()
            .expect("changeset fetches lock")
            .push(changeset_id.to_string());
        Ok(self.changeset.clone())
    }

    async fn apply_reconciliation(
        &self,
        _instance: &str,
        payload: ApplyReconciliationPayload,
    ) -> EngineResult<()> {
        self.reconciliation_calls
            .lock()
            .expect("reconciliation calls lock")
            .push(payload);
        match &self.reconciliation_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
