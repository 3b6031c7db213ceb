// Copyright (c) 2025 - Cowboy AI, Inc.
//! Drift Reconciliation Phase Machine
//!
//! ```text
//! Normal ──Block──> Blocked ──Approve──> Reconciling ──Applied──> Normal
//!                      ▲                      │
//!                      └──────ApplyFailed─────┘
//! ```
//!
//! A failed reconciliation keeps the drift details on display; resuming
//! after that is up to the operator.

use serde::{Deserialize, Serialize};

use super::{StateMachine, TransitionError, TransitionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPhase {
    #[default]
    Normal,
    Blocked,
    Reconciling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriftInput {
    Block,
    Approve,
    Applied,
    ApplyFailed,
}

impl StateMachine for DriftPhase {
    type Input = DriftInput;
    type Output = ();

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use DriftInput::*;
        use DriftPhase::*;

        let next = match (self, input) {
            (Normal, Block) => Blocked,
            (Blocked, Approve) => Reconciling,
            (Reconciling, Applied) => Normal,
            (Reconciling, ApplyFailed) => Blocked,
            (from, input) => return Err(TransitionError::invalid(from, input)),
        };
        Ok((next, ()))
    }
}
