// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Stream Events
//!
//! Events pushed by the engine while it tears a blueprint instance down.
//! Each event carries exactly one payload:
//!
//! ```text
//! ResourceUpdate  - a resource changed status
//! ChildUpdate     - a child blueprint changed status
//! LinkUpdate      - a link changed status
//! InstanceUpdate  - an instance (root or nested) changed status
//! Finish          - the operation reached a final status
//! ```
//!
//! Events are facts: they are applied in arrival order and never rejected,
//! only ignored when they repeat an already applied event ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    InstanceStatus, LinkStatus, PreciseLinkStatus, PreciseResourceStatus, ResourceStatus,
};

/// Event envelope as delivered on the event channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintInstanceEvent {
    /// Server-assigned event ID, usable as a resume cursor
    pub id: String,
    #[serde(flatten)]
    pub payload: DestroyEvent,
}

impl BlueprintInstanceEvent {
    pub fn new(id: impl Into<String>, payload: DestroyEvent) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Event payload union
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum DestroyEvent {
    ResourceUpdate(ResourceUpdateMessage),
    ChildUpdate(ChildUpdateMessage),
    LinkUpdate(LinkUpdateMessage),
    InstanceUpdate(InstanceUpdateMessage),
    Finish(FinishMessage),
}

impl DestroyEvent {
    /// Human-readable event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::ResourceUpdate(_) => "resourceUpdate",
            Self::ChildUpdate(_) => "childUpdate",
            Self::LinkUpdate(_) => "linkUpdate",
            Self::InstanceUpdate(_) => "instanceUpdate",
            Self::Finish(_) => "finish",
        }
    }

    /// ID of the instance the event is reported against
    pub fn instance_id(&self) -> &str {
        match self {
            Self::ResourceUpdate(e) => &e.instance_id,
            Self::ChildUpdate(e) => &e.parent_instance_id,
            Self::LinkUpdate(e) => &e.instance_id,
            Self::InstanceUpdate(e) => &e.instance_id,
            Self::Finish(e) => &e.instance_id,
        }
    }
}

/// Timing data reported alongside a status change, in milliseconds
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionDurations {
    pub prepare_duration: Option<f64>,
    pub config_complete_duration: Option<f64>,
    pub total_duration: Option<f64>,
    pub attempt_durations: Vec<f64>,
}

/// A resource changed status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceUpdateMessage {
    /// Instance that owns the resource
    pub instance_id: String,
    pub resource_id: String,
    pub resource_name: String,
    pub group: u32,
    pub status: ResourceStatus,
    pub precise_status: PreciseResourceStatus,
    pub failure_reasons: Vec<String>,
    pub attempt: u32,
    pub can_retry: bool,
    pub durations: Option<CompletionDurations>,
    pub update_timestamp: i64,
}

/// A child blueprint changed status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChildUpdateMessage {
    pub parent_instance_id: String,
    pub child_instance_id: String,
    pub child_name: String,
    pub group: u32,
    pub status: InstanceStatus,
    pub failure_reasons: Vec<String>,
    pub durations: Option<CompletionDurations>,
    pub update_timestamp: i64,
}

/// A link changed status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkUpdateMessage {
    /// Instance that owns the link
    pub instance_id: String,
    pub link_id: String,
    pub link_name: String,
    pub status: LinkStatus,
    pub precise_status: PreciseLinkStatus,
    pub failure_reasons: Vec<String>,
    pub current_stage_attempt: u32,
    pub can_retry_current_stage: bool,
    pub durations: Option<CompletionDurations>,
    pub update_timestamp: i64,
}

/// An instance changed status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceUpdateMessage {
    pub instance_id: String,
    pub status: InstanceStatus,
    pub update_timestamp: i64,
}

/// The operation reached a final status
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinishMessage {
    pub instance_id: String,
    pub status: InstanceStatus,
    pub failure_reasons: Vec<String>,
    pub finish_timestamp: i64,
    pub update_timestamp: i64,
    pub durations: Option<CompletionDurations>,
    /// No further events follow on this stream
    pub end_of_stream: bool,
}

impl FinishMessage {
    /// Finish time as a UTC timestamp
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.finish_timestamp, 0)
    }
}

/// Server-reported mid-stream failure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamFailure {
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Structured diagnostic attached to validation and stream errors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnostic {
    pub level: String,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}
