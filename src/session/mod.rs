// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Session
//!
//! The session is a pure reducer: every input is a [`Msg`], every I/O
//! request is an [`Effect`] returned as data.
//!
//! ```text
//! (SessionState, Msg) ──reduce()──> (SessionState, Vec<Effect>)
//!                                              │
//!                                              ▼
//!                                   driver performs the I/O and
//!                                   feeds the outcome back as Msg
//! ```
//!
//! Replaying a recorded message sequence through [`replay`] yields the same
//! state and effects as the live run, which is how the reducer is tested.
//!
//! # Flow
//!
//! ```text
//! Start ─> FetchInstanceState(pre) + FetchChangeset   (only what is missing)
//!       ─> StartDestroy ─> StreamEvents ─> AwaitEvent* ─> StopStream
//!                                                       + FetchInstanceState(post)
//! ```
//!
//! A drift refusal parks the session in `BlockedByDrift` until the operator
//! sends `ContinueAfterReconciliation`.

pub mod driver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::domain::{
    ApplyReconciliationPayload, BlueprintChanges, BlueprintInstanceState, Changeset,
    InstanceStatus,
};
use crate::drift::{DriftCoordinator, DriftView};
use crate::engine::{DestroyInstancePayload, DestroyStartResponse};
use crate::errors::{DestroyError, EngineError};
use crate::events::{BlueprintInstanceEvent, CompletionDurations, FinishMessage, StreamFailure};
use crate::finalize::FinalizeReport;
use crate::items::DestroyItem;
use crate::processor::{EventProcessor, ProcessOutcome};
use crate::results::{collect_results, DestroyResults};
use crate::state_machine::{PhaseInput, SessionPhase, StateMachine};

pub use driver::{run_session, spawn_session, Control, SessionHandle};

/// Which instance snapshot a fetch is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Snapshot {
    PreDestroy,
    PostDestroy,
}

/// Inputs of the session reducer
#[derive(Debug, Clone)]
pub enum Msg {
    /// Begin the destroy
    Start,
    PreDestroyStateFetched(Result<Option<BlueprintInstanceState>, EngineError>),
    ChangesetFetched(Result<Option<Changeset>, EngineError>),
    DestroyStarted(Result<DestroyStartResponse, EngineError>),
    /// Event delivery began; `at` is when the stream was requested
    StreamOpened { at: DateTime<Utc> },
    StreamOpenFailed(EngineError),
    EventReceived(BlueprintInstanceEvent),
    /// Result of an error poll; `None` when the poll timed out
    StreamError(Option<StreamFailure>),
    /// The event channel closed
    StreamClosed,
    /// Operator approved reconciling the reported drift
    ContinueAfterReconciliation,
    ReconciliationApplied(Result<(), EngineError>),
    PostDestroyStateFetched(Result<Option<BlueprintInstanceState>, EngineError>),
    /// Operator quit
    Terminate,
}

/// I/O requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchInstanceState {
        instance: String,
        snapshot: Snapshot,
    },
    FetchChangeset {
        changeset_id: String,
    },
    StartDestroy {
        instance: String,
        payload: DestroyInstancePayload,
    },
    StreamEvents {
        instance_id: String,
        last_event_id: Option<String>,
    },
    /// Race the next event against the error poll
    AwaitEvent,
    /// Stop consuming the event stream
    StopStream,
    ApplyReconciliation {
        instance: String,
        payload: ApplyReconciliationPayload,
    },
}

/// Final outcome of a destroy that reached a finish event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroySummary {
    pub instance_id: String,
    pub status: InstanceStatus,
    pub failure_reasons: Vec<String>,
    pub finished_at: Option<DateTime<Utc>>,
    pub durations: Option<CompletionDurations>,
    pub finalized: FinalizeReport,
    #[serde(flatten)]
    pub results: DestroyResults,
}

/// Read-only snapshot handed to the presentation layer after each message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: SessionPhase,
    pub instance_id: String,
    pub current_status: InstanceStatus,
    /// Items owned by the root instance, in first-seen order
    pub items: Vec<DestroyItem>,
    pub drift: Option<DriftView>,
    pub summary: Option<DestroySummary>,
    pub error: Option<DestroyError>,
    pub terminated: bool,
}

/// Complete state of one destroy session
#[derive(Debug, Clone)]
pub struct SessionState {
    config: SessionConfig,
    phase: SessionPhase,
    processor: EventProcessor,
    drift: DriftCoordinator,
    instance_id: String,
    changeset_id: Option<String>,
    resume_cursor: Option<String>,
    last_event_id: Option<String>,
    pre_destroy: Option<BlueprintInstanceState>,
    changes: Option<BlueprintChanges>,
    fetching_pre_destroy: bool,
    fetching_changeset: bool,
    primed: bool,
    /// Changeset whose contents the item skeleton was primed from
    primed_changeset_id: Option<String>,
    stream_opened_at: Option<DateTime<Utc>>,
    summary: Option<DestroySummary>,
    post_destroy: Option<BlueprintInstanceState>,
    post_destroy_error: Option<String>,
    error: Option<DestroyError>,
    terminated: bool,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        let instance_id = config.instance_id.clone().unwrap_or_default();
        Self {
            changeset_id: config.changeset_id.clone(),
            processor: EventProcessor::new(instance_id.clone()),
            config,
            phase: SessionPhase::Idle,
            drift: DriftCoordinator::new(),
            instance_id,
            resume_cursor: None,
            last_event_id: None,
            pre_destroy: None,
            changes: None,
            fetching_pre_destroy: false,
            fetching_changeset: false,
            primed: false,
            primed_changeset_id: None,
            stream_opened_at: None,
            summary: None,
            post_destroy: None,
            post_destroy_error: None,
            error: None,
            terminated: false,
        }
    }

    /// Use an already fetched pre-destroy snapshot
    pub fn with_pre_destroy_state(mut self, state: BlueprintInstanceState) -> Self {
        self.pre_destroy = Some(state);
        self
    }

    /// Use already fetched changeset contents
    pub fn with_changes(mut self, changes: BlueprintChanges) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    pub fn drift(&self) -> &DriftCoordinator {
        &self.drift
    }

    /// Instance ID assigned by the engine (or configured)
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Changeset the next destroy request uses
    pub fn changeset_id(&self) -> Option<&str> {
        self.changeset_id.as_deref()
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching_pre_destroy || self.fetching_changeset
    }

    pub fn summary(&self) -> Option<&DestroySummary> {
        self.summary.as_ref()
    }

    pub fn post_destroy_state(&self) -> Option<&BlueprintInstanceState> {
        self.post_destroy.as_ref()
    }

    pub fn post_destroy_error(&self) -> Option<&str> {
        self.post_destroy_error.as_deref()
    }

    pub fn error(&self) -> Option<&DestroyError> {
        self.error.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// `true` when no message can move the session forward
    pub fn is_done(&self) -> bool {
        self.terminated || self.phase.is_terminal()
    }

    /// Result lists once the destroy finished
    pub fn results(&self) -> Option<&DestroyResults> {
        self.summary.as_ref().map(|s| &s.results)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            instance_id: self.instance_id.clone(),
            current_status: self.processor.current_status(),
            items: self.processor.registry().root_items().cloned().collect(),
            drift: self.drift.view(),
            summary: self.summary.clone(),
            error: self.error.clone(),
            terminated: self.terminated,
        }
    }

    fn advance(&mut self, input: PhaseInput) -> bool {
        match self.phase.transition(&input) {
            Ok((next, _)) => {
                debug!(from = ?self.phase, to = ?next, ?input, "session phase changed");
                self.phase = next;
                true
            }
            Err(err) => {
                warn!(error = %err, "ignoring message not valid in this phase");
                false
            }
        }
    }

    fn fail(&mut self, err: DestroyError) -> Vec<Effect> {
        error!(error = %err, phase = ?self.phase, "destroy failed");
        let was_streaming = self.phase.is_streaming();
        if !self.advance(PhaseInput::Fail) {
            return Vec::new();
        }
        self.error = Some(err);
        if was_streaming {
            vec![Effect::StopStream]
        } else {
            Vec::new()
        }
    }
}

/// Apply one message to the session
pub fn reduce(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    if state.terminated {
        debug!(?msg, "session terminated, dropping message");
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Start => on_start(&mut state),
        Msg::PreDestroyStateFetched(result) => on_pre_destroy_state(&mut state, result),
        Msg::ChangesetFetched(result) => on_changeset(&mut state, result),
        Msg::DestroyStarted(result) => on_destroy_started(&mut state, result),
        Msg::StreamOpened { at } => on_stream_opened(&mut state, at),
        Msg::StreamOpenFailed(err) => state.fail(err.into()),
        Msg::EventReceived(event) => on_event(&mut state, event),
        Msg::StreamError(failure) => on_stream_error(&mut state, failure),
        Msg::StreamClosed => on_stream_closed(&mut state),
        Msg::ContinueAfterReconciliation => on_continue(&mut state),
        Msg::ReconciliationApplied(result) => on_reconciliation_applied(&mut state, result),
        Msg::PostDestroyStateFetched(result) => on_post_destroy_state(&mut state, result),
        Msg::Terminate => on_terminate(&mut state),
    };
    (state, effects)
}

/// Fold a message sequence through the reducer
pub fn replay(
    initial: SessionState,
    messages: impl IntoIterator<Item = Msg>,
) -> (SessionState, Vec<Effect>) {
    messages
        .into_iter()
        .fold((initial, Vec::new()), |(state, mut all_effects), msg| {
            let (next, effects) = reduce(state, msg);
            all_effects.extend(effects);
            (next, all_effects)
        })
}

fn on_start(state: &mut SessionState) -> Vec<Effect> {
    let needs_pre_destroy = state.pre_destroy.is_none();
    let needs_changeset = state.changeset_id.is_some() && state.changes.is_none();

    if !needs_pre_destroy && !needs_changeset {
        if !state.advance(PhaseInput::BeginDestroy) {
            return Vec::new();
        }
        return begin_destroy(state);
    }
    if !state.advance(PhaseInput::Prepare) {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if needs_pre_destroy {
        state.fetching_pre_destroy = true;
        effects.push(Effect::FetchInstanceState {
            instance: state.config.instance_identifier().to_string(),
            snapshot: Snapshot::PreDestroy,
        });
    }
    if let (true, Some(changeset_id)) = (needs_changeset, &state.changeset_id) {
        state.fetching_changeset = true;
        effects.push(Effect::FetchChangeset {
            changeset_id: changeset_id.clone(),
        });
    }
    info!(
        pre_destroy = needs_pre_destroy,
        changeset = needs_changeset,
        "fetching destroy context"
    );
    effects
}

fn on_pre_destroy_state(
    state: &mut SessionState,
    result: Result<Option<BlueprintInstanceState>, EngineError>,
) -> Vec<Effect> {
    if !state.fetching_pre_destroy {
        return Vec::new();
    }
    state.fetching_pre_destroy = false;
    match result {
        Ok(snapshot) => {
            if snapshot.is_none() {
                debug!("no pre-destroy snapshot available");
            }
            state.pre_destroy = snapshot;
        }
        Err(err) => return state.fail(err.into()),
    }
    after_fetch(state)
}

fn on_changeset(
    state: &mut SessionState,
    result: Result<Option<Changeset>, EngineError>,
) -> Vec<Effect> {
    if !state.fetching_changeset {
        return Vec::new();
    }
    state.fetching_changeset = false;
    match result {
        Ok(changeset) => state.changes = changeset.and_then(|c| c.changes),
        Err(err) => return state.fail(err.into()),
    }
    after_fetch(state)
}

fn after_fetch(state: &mut SessionState) -> Vec<Effect> {
    if state.is_fetching() {
        return Vec::new();
    }
    match state.phase {
        SessionPhase::Preparing => {
            if !state.advance(PhaseInput::FetchesDone) {
                return Vec::new();
            }
        }
        // changeset re-fetched after reconciliation
        SessionPhase::Starting => {}
        _ => return Vec::new(),
    }
    begin_destroy(state)
}

fn begin_destroy(state: &mut SessionState) -> Vec<Effect> {
    if !state.primed {
        state.primed = true;
        state.primed_changeset_id = state.changeset_id.clone();
        state
            .processor
            .prime(state.changes.clone(), state.pre_destroy.clone());
    }
    info!(
        instance = state.config.instance_identifier(),
        changeset_id = ?state.changeset_id,
        force = state.config.force,
        "requesting destroy"
    );
    vec![Effect::StartDestroy {
        instance: state.config.instance_identifier().to_string(),
        payload: DestroyInstancePayload {
            changeset_id: state.changeset_id.clone(),
            force: state.config.force,
        },
    }]
}

fn on_destroy_started(
    state: &mut SessionState,
    result: Result<DestroyStartResponse, EngineError>,
) -> Vec<Effect> {
    if state.phase != SessionPhase::Starting {
        warn!(phase = ?state.phase, "destroy response outside of start, ignoring");
        return Vec::new();
    }

    match result {
        Ok(response) => {
            state.advance(PhaseInput::Accepted);
            if !response.instance_id.is_empty() {
                state.instance_id = response.instance_id.clone();
                state.processor.set_root_instance(response.instance_id);
            }
            state.resume_cursor = Some(response.last_event_id).filter(|id| !id.is_empty());
            info!(instance_id = %state.instance_id, resume = ?state.resume_cursor, "destroy accepted");
            vec![Effect::StreamEvents {
                instance_id: state.instance_id.clone(),
                last_event_id: state.resume_cursor.clone(),
            }]
        }
        Err(EngineError::DriftBlocked {
            message,
            changeset_id,
            reconciliation,
        }) => {
            if let Err(err) = state.drift.block(message, changeset_id, *reconciliation) {
                warn!(error = %err, "drift coordinator rejected block");
            }
            state.advance(PhaseInput::DriftBlocked);
            vec![Effect::StopStream]
        }
        Err(EngineError::ChangesetTypeMismatch { message }) => {
            warn!(%message, "changeset was not staged for a destroy");
            state.advance(PhaseInput::ChangesetMismatch);
            state.error = Some(DestroyError::ChangesetTypeMismatch { message });
            Vec::new()
        }
        Err(err) => state.fail(err.into()),
    }
}

fn on_stream_opened(state: &mut SessionState, at: DateTime<Utc>) -> Vec<Effect> {
    if !state.phase.is_streaming() {
        return Vec::new();
    }
    state.stream_opened_at = Some(at);
    vec![Effect::AwaitEvent]
}

fn on_event(state: &mut SessionState, event: BlueprintInstanceEvent) -> Vec<Effect> {
    if !state.phase.is_streaming() {
        debug!(event_id = %event.id, phase = ?state.phase, "event outside of streaming, ignoring");
        return Vec::new();
    }
    if !event.id.is_empty() {
        state.last_event_id = Some(event.id.clone());
    }

    match state.processor.process(&event) {
        ProcessOutcome::Finish(finish) => on_finish(state, finish),
        _ => vec![Effect::AwaitEvent],
    }
}

fn is_stale_finish(state: &SessionState, finish: &FinishMessage) -> bool {
    if state.resume_cursor.is_some() {
        return false;
    }
    match (state.stream_opened_at, finish.finished_at()) {
        (Some(opened), Some(finished)) => {
            finished < opened - state.config.stale_finish_threshold()
        }
        _ => false,
    }
}

fn on_finish(state: &mut SessionState, finish: FinishMessage) -> Vec<Effect> {
    if is_stale_finish(state, &finish) {
        info!(finish_timestamp = finish.finish_timestamp, "ignoring stale finish event");
        return vec![Effect::AwaitEvent];
    }

    state.processor.record_final_status(finish.status);
    if !finish.end_of_stream {
        debug!(status = %finish.status, "finish without end of stream, waiting");
        return vec![Effect::AwaitEvent];
    }

    let finalized = state.processor.finalize().unwrap_or_default();
    if !state.advance(PhaseInput::Finish) {
        return Vec::new();
    }
    let results = collect_results(state.processor.registry());
    info!(
        status = %finish.status,
        destroyed = results.destroyed_elements.len(),
        failed = results.failed_elements.len(),
        interrupted = results.interrupted_elements.len(),
        "destroy finished"
    );
    state.summary = Some(DestroySummary {
        instance_id: state.instance_id.clone(),
        status: finish.status,
        finished_at: finish.finished_at(),
        failure_reasons: finish.failure_reasons,
        durations: finish.durations,
        finalized,
        results,
    });

    vec![
        Effect::StopStream,
        Effect::FetchInstanceState {
            instance: state.instance_id.clone(),
            snapshot: Snapshot::PostDestroy,
        },
    ]
}

fn on_stream_error(state: &mut SessionState, failure: Option<StreamFailure>) -> Vec<Effect> {
    match failure {
        Some(failure) if state.phase.is_streaming() => state.fail(failure.into()),
        Some(failure) => {
            debug!(message = %failure.message, "stream error outside of streaming, ignoring");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn on_stream_closed(state: &mut SessionState) -> Vec<Effect> {
    if !state.phase.is_streaming() {
        return Vec::new();
    }
    state.fail(DestroyError::StreamClosedUnexpectedly)
}

fn on_continue(state: &mut SessionState) -> Vec<Effect> {
    if !state.phase.can_transition(&PhaseInput::Approve) {
        warn!(phase = ?state.phase, "nothing to reconcile");
        return Vec::new();
    }
    let payload = match state.drift.approve() {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "cannot approve reconciliation");
            return Vec::new();
        }
    };
    state.advance(PhaseInput::Approve);
    info!(
        resources = payload.resource_actions.len(),
        links = payload.link_actions.len(),
        "applying reconciliation"
    );
    vec![Effect::ApplyReconciliation {
        instance: state.config.instance_identifier().to_string(),
        payload,
    }]
}

fn on_reconciliation_applied(
    state: &mut SessionState,
    result: Result<(), EngineError>,
) -> Vec<Effect> {
    if state.phase != SessionPhase::Reconciling {
        return Vec::new();
    }
    match result {
        Ok(()) => {
            let resumed = match state.drift.applied() {
                Ok(resumed) => resumed,
                Err(err) => {
                    warn!(error = %err, "drift coordinator out of step");
                    None
                }
            };
            state.advance(PhaseInput::Reconciled);
            match resumed {
                Some(changeset_id) if state.primed_changeset_id.as_ref() != Some(&changeset_id) => {
                    reprime_for_changeset(state, changeset_id)
                }
                _ => begin_destroy(state),
            }
        }
        Err(err) => {
            if let Err(transition) = state.drift.apply_failed() {
                warn!(error = %transition, "drift coordinator out of step");
            }
            state.fail(DestroyError::Reconciliation {
                message: err.to_string(),
            })
        }
    }
}

/// Drop the skeleton primed from the previous changeset and fetch the
/// contents of the one the destroy resumes with.
fn reprime_for_changeset(state: &mut SessionState, changeset_id: String) -> Vec<Effect> {
    info!(
        previous = ?state.primed_changeset_id,
        changeset_id = %changeset_id,
        "resuming with a different changeset, fetching its contents"
    );
    state.processor = EventProcessor::new(state.instance_id.clone());
    state.primed = false;
    state.changes = None;
    state.changeset_id = Some(changeset_id.clone());
    state.fetching_changeset = true;
    vec![Effect::FetchChangeset { changeset_id }]
}

fn on_post_destroy_state(
    state: &mut SessionState,
    result: Result<Option<BlueprintInstanceState>, EngineError>,
) -> Vec<Effect> {
    match result {
        Ok(snapshot) => state.post_destroy = snapshot,
        Err(err) => {
            warn!(error = %err, "could not fetch post-destroy state");
            state.post_destroy_error = Some(err.to_string());
        }
    }
    Vec::new()
}

fn on_terminate(state: &mut SessionState) -> Vec<Effect> {
    info!(phase = ?state.phase, "session terminated");
    state.terminated = true;
    if state.phase.is_streaming() {
        vec![Effect::StopStream]
    } else {
        Vec::new()
    }
}
