// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Session Phase Machine
//!
//! # State Machine Type
//!
//! This is a **Moore Machine**: the phase alone tells the driver which
//! operations may be outstanding.
//!
//! # States
//!
//! ```text
//!                 Prepare            FetchesDone
//!   Idle ───────────────> Preparing ─────────────┐
//!    │                                            ▼
//!    └──────────── BeginDestroy ───────────> Starting ──DriftBlocked──> BlockedByDrift
//!                                              │  │  ▲                       │
//!                          ChangesetMismatch ──┘  │  └─Reconciled─ Reconciling <─Approve─┘
//!                                  ▼              │ Accepted
//!                       ChangesetTypeMismatch     ▼
//!                                              Streaming ──Finish──> Finished
//!
//!   any non-terminal ──Fail──> Failed
//! ```
//!
//! `Finished`, `ChangesetTypeMismatch` and `Failed` are terminal.

use serde::{Deserialize, Serialize};

use super::{StateMachine, TransitionError, TransitionResult};

/// Phase of a destroy session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Waiting for the pre-destroy snapshot and/or changeset
    Preparing,
    /// Destroy request sent, waiting for the engine to accept it
    Starting,
    /// Consuming the event stream
    Streaming,
    /// The engine refused to destroy until drift is reconciled
    BlockedByDrift,
    /// Reconciliation request sent
    Reconciling,
    Finished,
    /// The changeset was staged for a deploy, not a destroy
    ChangesetTypeMismatch,
    Failed,
}

/// Inputs of the session phase machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseInput {
    Prepare,
    FetchesDone,
    BeginDestroy,
    Accepted,
    DriftBlocked,
    ChangesetMismatch,
    Approve,
    Reconciled,
    Finish,
    Fail,
}

impl SessionPhase {
    /// `true` while events from the stream are expected
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }
}

impl StateMachine for SessionPhase {
    type Input = PhaseInput;
    type Output = ();

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use PhaseInput::*;
        use SessionPhase::*;

        if self.is_terminal() {
            return Err(TransitionError::Terminal(format!("{self:?}")));
        }

        let next = match (self, input) {
            (_, Fail) => Failed,
            (Idle, Prepare) => Preparing,
            (Idle, BeginDestroy) => Starting,
            (Preparing, FetchesDone) => Starting,
            (Starting, Accepted) => Streaming,
            (Starting, DriftBlocked) => BlockedByDrift,
            (Starting, ChangesetMismatch) => ChangesetTypeMismatch,
            (BlockedByDrift, Approve) => Reconciling,
            (Reconciling, Reconciled) => Starting,
            (Streaming, Finish) => Finished,
            (from, input) => return Err(TransitionError::invalid(from, input)),
        };
        Ok((next, ()))
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Finished | SessionPhase::ChangesetTypeMismatch | SessionPhase::Failed
        )
    }
}
