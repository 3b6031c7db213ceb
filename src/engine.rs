// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine Client Seam
//!
//! The component that actually deletes infrastructure lives behind
//! [`EngineClient`]. The session driver only needs a handful of
//! request/response calls plus one call that starts asynchronous event
//! delivery onto channels it owns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{ApplyReconciliationPayload, BlueprintInstanceState, Changeset};
use crate::errors::EngineResult;
use crate::events::{BlueprintInstanceEvent, StreamFailure};

/// Body of a destroy request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyInstancePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changeset_id: Option<String>,
    /// Destroy even if resources are in an unexpected state
    pub force: bool,
}

/// Accepted destroy request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DestroyStartResponse {
    pub instance_id: String,
    /// Resume cursor for the event stream; empty for a fresh stream
    pub last_event_id: String,
}

/// Client for the deployment engine
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Ask the engine to destroy an instance (by ID or name)
    async fn destroy_blueprint_instance(
        &self,
        instance: &str,
        payload: DestroyInstancePayload,
    ) -> EngineResult<DestroyStartResponse>;

    /// Begin delivering events for an instance.
    ///
    /// Returns once delivery has started; events and stream failures are
    /// then sent on the given channels until the stream ends or the
    /// receivers are dropped. Dropping the event sender ends the stream.
    async fn stream_blueprint_instance_events(
        &self,
        instance_id: &str,
        last_event_id: Option<&str>,
        events: mpsc::Sender<BlueprintInstanceEvent>,
        errors: mpsc::Sender<StreamFailure>,
    ) -> EngineResult<()>;

    async fn get_blueprint_instance_state(
        &self,
        instance: &str,
    ) -> EngineResult<Option<BlueprintInstanceState>>;

    async fn get_changeset(&self, changeset_id: &str) -> EngineResult<Option<Changeset>>;

    async fn apply_reconciliation(
        &self,
        instance: &str,
        payload: ApplyReconciliationPayload,
    ) -> EngineResult<()>;
}
