// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Phases of a destroy session are modeled as small, pure state machines.
//! A transition is a deterministic function with no side effects:
//!
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! The reducer asks the machine whether a message is legal in the current
//! phase before touching anything else, so an out-of-order message (a late
//! worker result, a repeated operator command) is rejected as a
//! [`TransitionError`] instead of corrupting the session.
//!
//! - [`session_phase`] - top-level destroy session lifecycle
//! - [`drift_phase`] - drift-blocked / reconciling side branch

pub mod drift_phase;
pub mod session_phase;

pub use drift_phase::{DriftInput, DriftPhase};
pub use session_phase::{PhaseInput, SessionPhase};

pub type TransitionResult<S> = Result<S, TransitionError>;

/// Rejected phase transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition from current state with the given input is not allowed
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },

    /// The machine is in a terminal state
    #[error("State {0} is terminal")]
    Terminal(String),
}

impl TransitionError {
    pub fn invalid(from: impl std::fmt::Debug, input: impl std::fmt::Debug) -> Self {
        Self::InvalidTransition {
            from: format!("{from:?}"),
            input: format!("{input:?}"),
        }
    }
}

/// A phase machine with typed inputs.
///
/// `transition` is total over inputs: every pair either yields the next
/// phase or a [`TransitionError`], never a panic.
pub trait StateMachine: Sized + Clone {
    type Input;

    /// Produced alongside the next phase; `()` for most machines
    type Output;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// `true` when no input leads out of this state
    fn is_terminal(&self) -> bool {
        false
    }
}
