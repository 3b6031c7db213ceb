// Copyright (c) 2025 - Cowboy AI, Inc.
//! Session driver
//!
//! Runs [`reduce`](super::reduce) against a live [`EngineClient`]. Effects
//! that call the engine become boxed worker futures in a
//! `FuturesUnordered`; stream effects open, listen on, or drop the event
//! and error channels owned by the loop.
//!
//! Events already delivered are applied before the error poll. When the
//! event channel closes, a failure still queued on the error channel is
//! reported instead of an unexpected close.
//!
//! ```text
//! control ─┐
//! workers ─┼─ select! ─> Msg ─> reduce ─> effects ─> workers / channels
//! errors  ─┤                      │
//! events  ─┘                      └─> watch<SessionView>
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::{reduce, Effect, Msg, SessionState, SessionView, Snapshot};
use crate::domain::ApplyReconciliationPayload;
use crate::engine::{DestroyInstancePayload, EngineClient};
use crate::events::{BlueprintInstanceEvent, StreamFailure};

type Worker = Pin<Box<dyn Future<Output = Msg> + Send>>;

/// Operator commands delivered to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ContinueAfterReconciliation,
    Terminate,
}

impl From<Control> for Msg {
    fn from(control: Control) -> Self {
        match control {
            Control::ContinueAfterReconciliation => Msg::ContinueAfterReconciliation,
            Control::Terminate => Msg::Terminate,
        }
    }
}

/// Handle to a session running on the tokio runtime
pub struct SessionHandle {
    control: mpsc::Sender<Control>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<SessionState>,
}

impl SessionHandle {
    /// Approve reconciling reported drift. Returns `false` if the session
    /// already ended.
    pub async fn continue_after_reconciliation(&self) -> bool {
        self.control
            .send(Control::ContinueAfterReconciliation)
            .await
            .is_ok()
    }

    pub async fn terminate(&self) -> bool {
        self.control.send(Control::Terminate).await.is_ok()
    }

    /// Latest published view
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified after every processed message
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait for the session to end
    pub async fn join(self) -> Result<SessionState, JoinError> {
        self.task.await
    }
}

/// Spawn a session onto the current runtime
pub fn spawn_session<E>(engine: Arc<E>, state: SessionState) -> SessionHandle
where
    E: EngineClient + 'static,
{
    let (control_tx, control_rx) = mpsc::channel(8);
    let (view_tx, view_rx) = watch::channel(state.view());
    let task = tokio::spawn(run_session(engine, state, control_rx, view_tx));
    SessionHandle {
        control: control_tx,
        view: view_rx,
        task,
    }
}

/// Drive a session until it reaches a terminal phase or is terminated
pub async fn run_session<E>(
    engine: Arc<E>,
    state: SessionState,
    control: mpsc::Receiver<Control>,
    view_tx: watch::Sender<SessionView>,
) -> SessionState
where
    E: EngineClient + 'static,
{
    let session_id = Uuid::now_v7();
    let span = info_span!(
        "destroy_session",
        %session_id,
        instance = state.config().instance_identifier()
    );
    Driver {
        engine,
        control: Some(control),
        view_tx,
        workers: FuturesUnordered::new(),
        events: None,
        errors: None,
        listening: false,
    }
    .run(state)
    .instrument(span)
    .await
}

struct Driver<E> {
    engine: Arc<E>,
    control: Option<mpsc::Receiver<Control>>,
    view_tx: watch::Sender<SessionView>,
    workers: FuturesUnordered<Worker>,
    events: Option<mpsc::Receiver<BlueprintInstanceEvent>>,
    errors: Option<mpsc::Receiver<StreamFailure>>,
    listening: bool,
}

impl<E> Driver<E>
where
    E: EngineClient + 'static,
{
    async fn run(mut self, initial: SessionState) -> SessionState {
        let error_poll = initial.config().error_poll_timeout();
        let capacity = initial.config().event_channel_capacity.max(1);
        let mut state = self.apply(initial, Msg::Start, capacity);

        loop {
            if state.is_terminated() || (state.is_done() && self.workers.is_empty()) {
                break;
            }

            let listening = self.listening;
            let next = tokio::select! {
                biased;

                command = recv_control(&mut self.control), if self.control.is_some() => {
                    match command {
                        Some(command) => Some(Msg::from(command)),
                        None => {
                            debug!("control channel closed");
                            self.control = None;
                            None
                        }
                    }
                }

                Some(msg) = self.workers.next(), if !self.workers.is_empty() => Some(msg),

                event = recv_event(&mut self.events), if listening && self.events.is_some() => {
                    match event {
                        Some(event) => {
                            self.listening = false;
                            Some(Msg::EventReceived(event))
                        }
                        None => {
                            self.events = None;
                            self.listening = false;
                            // a producer that reports a failure and exits closes both channels
                            match self.errors.as_mut().and_then(|errors| errors.try_recv().ok()) {
                                Some(failure) => Some(Msg::StreamError(Some(failure))),
                                None => Some(Msg::StreamClosed),
                            }
                        }
                    }
                }

                polled = poll_error(&mut self.errors, error_poll), if listening && self.errors.is_some() => {
                    match polled {
                        ErrorPoll::Failure(failure) => Some(Msg::StreamError(Some(failure))),
                        ErrorPoll::TimedOut => Some(Msg::StreamError(None)),
                        ErrorPoll::Closed => {
                            self.errors = None;
                            None
                        }
                    }
                }

                else => break,
            };

            if let Some(msg) = next {
                state = self.apply(state, msg, capacity);
            }
        }

        info!(phase = ?state.phase(), terminated = state.is_terminated(), "session ended");
        state
    }

    fn apply(&mut self, state: SessionState, msg: Msg, capacity: usize) -> SessionState {
        let (state, effects) = reduce(state, msg);
        self.view_tx.send_replace(state.view());
        for effect in effects {
            self.dispatch(effect, capacity);
        }
        state
    }

    fn dispatch(&mut self, effect: Effect, capacity: usize) {
        match effect {
            Effect::StreamEvents {
                instance_id,
                last_event_id,
            } => {
                let (event_tx, event_rx) = mpsc::channel(capacity);
                let (error_tx, error_rx) = mpsc::channel(capacity);
                self.events = Some(event_rx);
                self.errors = Some(error_rx);
                self.listening = false;

                let engine = Arc::clone(&self.engine);
                self.workers.push(Box::pin(async move {
                    let at = Utc::now();
                    match engine
                        .stream_blueprint_instance_events(
                            &instance_id,
                            last_event_id.as_deref(),
                            event_tx,
                            error_tx,
                        )
                        .await
                    {
                        Ok(()) => Msg::StreamOpened { at },
                        Err(err) => Msg::StreamOpenFailed(err),
                    }
                }));
            }
            Effect::AwaitEvent => self.listening = true,
            Effect::StopStream => {
                self.listening = false;
                self.events = None;
                self.errors = None;
            }
            Effect::FetchInstanceState { instance, snapshot } => {
                self.call(EngineCall::InstanceState { instance, snapshot })
            }
            Effect::FetchChangeset { changeset_id } => {
                self.call(EngineCall::Changeset { changeset_id })
            }
            Effect::StartDestroy { instance, payload } => {
                self.call(EngineCall::Destroy { instance, payload })
            }
            Effect::ApplyReconciliation { instance, payload } => {
                self.call(EngineCall::Reconcile { instance, payload })
            }
        }
    }

    fn call(&mut self, call: EngineCall) {
        self.workers.push(call.into_worker(Arc::clone(&self.engine)));
    }
}

/// Request/response engine calls, run as workers
enum EngineCall {
    InstanceState { instance: String, snapshot: Snapshot },
    Changeset { changeset_id: String },
    Destroy { instance: String, payload: DestroyInstancePayload },
    Reconcile { instance: String, payload: ApplyReconciliationPayload },
}

impl EngineCall {
    /// Worker producing the message that reports the call's result
    fn into_worker<E>(self, engine: Arc<E>) -> Worker
    where
        E: EngineClient + 'static,
    {
        match self {
            EngineCall::InstanceState { instance, snapshot } => Box::pin(async move {
                let result = engine.get_blueprint_instance_state(&instance).await;
                match snapshot {
                    Snapshot::PreDestroy => Msg::PreDestroyStateFetched(result),
                    Snapshot::PostDestroy => Msg::PostDestroyStateFetched(result),
                }
            }),
            EngineCall::Changeset { changeset_id } => Box::pin(async move {
                Msg::ChangesetFetched(engine.get_changeset(&changeset_id).await)
            }),
            EngineCall::Destroy { instance, payload } => Box::pin(async move {
                Msg::DestroyStarted(engine.destroy_blueprint_instance(&instance, payload).await)
            }),
            EngineCall::Reconcile { instance, payload } => Box::pin(async move {
                Msg::ReconciliationApplied(engine.apply_reconciliation(&instance, payload).await)
            }),
        }
    }
}

enum ErrorPoll {
    Failure(StreamFailure),
    TimedOut,
    Closed,
}

async fn poll_error(
    errors: &mut Option<mpsc::Receiver<StreamFailure>>,
    wait: Duration,
) -> ErrorPoll {
    let Some(errors) = errors else {
        return std::future::pending().await;
    };
    match timeout(wait, errors.recv()).await {
        Ok(Some(failure)) => ErrorPoll::Failure(failure),
        Ok(None) => ErrorPoll::Closed,
        Err(_) => ErrorPoll::TimedOut,
    }
}

async fn recv_event(
    events: &mut Option<mpsc::Receiver<BlueprintInstanceEvent>>,
) -> Option<BlueprintInstanceEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_control(control: &mut Option<mpsc::Receiver<Control>>) -> Option<Control> {
    match control {
        Some(control) => control.recv().await,
        None => std::future::pending().await,
    }
}
