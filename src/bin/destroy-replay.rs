// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Replay
//!
//! Replays a recorded destroy against an in-process engine and prints the
//! resulting summary as JSON. Useful for checking how a captured event
//! stream is reconstructed without touching real infrastructure.
//!
//! Run with: cargo run --bin destroy-replay -- recording.json
//!
//! Recording format (all fields optional except `events`):
//!
//! ```text
//! {
//!   "instanceId": "...",
//!   "preDestroyState": { ... },
//!   "postDestroyState": { ... },
//!   "changeset": { ... },
//!   "drift": { "message": "...", "changesetId": "...", "reconciliation": { ... } },
//!   "events": [ { "id": "...", "type": "resourceUpdate", "data": { ... } }, ... ]
//! }
//! ```
//!
//! Session settings come from the `DESTROY_*` environment variables; the
//! recording's instance ID is used when none is set. A recorded drift block
//! is approved automatically when `DESTROY_APPROVE_DRIFT` is set.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use blueprint_destroy::domain::{
    ApplyReconciliationPayload, BlueprintInstanceState, Changeset, ReconciliationCheckResult,
};
use blueprint_destroy::engine::{DestroyInstancePayload, DestroyStartResponse, EngineClient};
use blueprint_destroy::errors::{EngineError, EngineResult};
use blueprint_destroy::events::{BlueprintInstanceEvent, StreamFailure};
use blueprint_destroy::session::{spawn_session, SessionState};
use blueprint_destroy::state_machine::SessionPhase;
use blueprint_destroy::SessionConfig;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Resume cursor reported for a replay; recorded finish events predate the
/// replay and must not be treated as stale
const REPLAY_CURSOR: &str = "recording-start";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Recording {
    instance_id: String,
    pre_destroy_state: Option<BlueprintInstanceState>,
    post_destroy_state: Option<BlueprintInstanceState>,
    changeset: Option<Changeset>,
    drift: Option<RecordedDrift>,
    events: Vec<BlueprintInstanceEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedDrift {
    message: String,
    #[serde(default)]
    changeset_id: String,
    reconciliation: ReconciliationCheckResult,
}

/// Engine that answers from a recording
struct ReplayEngine {
    recording: Recording,
    drift_pending: AtomicBool,
    destroyed: AtomicBool,
}

impl ReplayEngine {
    fn new(recording: Recording) -> Self {
        let drift_pending = AtomicBool::new(recording.drift.is_some());
        Self {
            recording,
            drift_pending,
            destroyed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EngineClient for ReplayEngine {
    async fn destroy_blueprint_instance(
        &self,
        instance: &str,
        payload: DestroyInstancePayload,
    ) -> EngineResult<DestroyStartResponse> {
        info!(instance, ?payload, "replaying destroy request");
        if let (true, Some(drift)) = (
            self.drift_pending.load(Ordering::SeqCst),
            &self.recording.drift,
        ) {
            return Err(EngineError::DriftBlocked {
                message: drift.message.clone(),
                changeset_id: drift.changeset_id.clone(),
                reconciliation: Box::new(drift.reconciliation.clone()),
            });
        }
        self.destroyed.store(true, Ordering::SeqCst);
        let instance_id = if self.recording.instance_id.is_empty() {
            instance.to_string()
        } else {
            self.recording.instance_id.clone()
        };
        Ok(DestroyStartResponse {
            instance_id,
            last_event_id: REPLAY_CURSOR.to_string(),
        })
    }

    async fn stream_blueprint_instance_events(
        &self,
        _instance_id: &str,
        _last_event_id: Option<&str>,
        events: mpsc::Sender<BlueprintInstanceEvent>,
        _errors: mpsc::Sender<StreamFailure>,
    ) -> EngineResult<()> {
        let recorded = self.recording.events.clone();
        tokio::spawn(async move {
            for event in recorded {
                if events.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn get_blueprint_instance_state(
        &self,
        _instance: &str,
    ) -> EngineResult<Option<BlueprintInstanceState>> {
        if self.destroyed.load(Ordering::SeqCst) {
            Ok(self.recording.post_destroy_state.clone())
        } else {
            Ok(self.recording.pre_destroy_state.clone())
        }
    }

    async fn get_changeset(&self, changeset_id: &str) -> EngineResult<Option<Changeset>> {
        Ok(self
            .recording
            .changeset
            .clone()
            .filter(|changeset| changeset.id == changeset_id))
    }

    async fn apply_reconciliation(
        &self,
        instance: &str,
        payload: ApplyReconciliationPayload,
    ) -> EngineResult<()> {
        info!(
            instance,
            resources = payload.resource_actions.len(),
            links = payload.link_actions.len(),
            "replaying reconciliation"
        );
        self.drift_pending.store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn load_config(recording: &Recording) -> Result<SessionConfig> {
    let config = SessionConfig::from_lookup(|name| match std::env::var(name).ok() {
        None if name == "DESTROY_INSTANCE_ID" && !recording.instance_id.is_empty() => {
            Some(recording.instance_id.clone())
        }
        value => value,
    })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: destroy-replay <recording.json>")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    let recording: Recording = serde_json::from_str(&raw).context("Failed to parse recording")?;
    info!(events = recording.events.len(), "recording loaded");

    let config = load_config(&recording)?;
    let approve_drift = std::env::var("DESTROY_APPROVE_DRIFT").is_ok();

    let engine = Arc::new(ReplayEngine::new(recording));
    let handle = spawn_session(engine, SessionState::new(config));

    let mut views = handle.subscribe();
    while views.changed().await.is_ok() {
        let phase = views.borrow_and_update().phase;
        if phase == SessionPhase::BlockedByDrift {
            if approve_drift {
                info!("approving drift reconciliation");
                handle.continue_after_reconciliation().await;
            } else {
                warn!("destroy blocked by drift; set DESTROY_APPROVE_DRIFT to reconcile");
                handle.terminate().await;
            }
        }
    }

    let state = handle.join().await.context("Session task failed")?;
    let view = state.view();
    if let Some(drift) = &view.drift {
        println!("{}", serde_json::to_string_pretty(drift)?);
    }
    match (state.summary(), state.error()) {
        (Some(summary), _) => println!("{}", serde_json::to_string_pretty(summary)?),
        (None, Some(err)) => anyhow::bail!("Destroy failed: {err}"),
        (None, None) => anyhow::bail!("Destroy ended in phase {:?}", state.phase()),
    }
    Ok(())
}
