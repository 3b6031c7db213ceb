// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy orchestration for blueprint instances
//!
//! A destroy is requested from the deploy engine, which answers with an
//! asynchronous stream of progress events. This crate rebuilds a coherent
//! picture of every resource, child blueprint and link from that stream,
//! settles anything left unfinished, and reports what was destroyed, what
//! failed and what was interrupted.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   events   ┌────────────────┐   items   ┌─────────────┐
//! │ EngineClient │ ─────────> │ EventProcessor │ ────────> │ ItemRegistry│
//! └──────────────┘            │  (PathBuilder) │           └──────┬──────┘
//!        ▲                    └────────────────┘                  │
//!        │ effects                                   finalize() + collect_results()
//! ┌──────┴───────┐                                                 │
//! │ session      │ <───────────────────────────────────────────────┘
//! │ reduce/driver│ <── DriftCoordinator (drift block / reconcile)
//! └──────────────┘
//! ```
//!
//! The session is a pure reducer ([`session::reduce`]); the driver in
//! [`session::driver`] performs its effects against an [`EngineClient`].

pub mod classify;
pub mod config;
pub mod domain;
pub mod drift;
pub mod engine;
pub mod errors;
pub mod events;
pub mod finalize;
pub mod items;
pub mod paths;
pub mod processor;
pub mod results;
pub mod session;
pub mod state_machine;

pub use classify::{Classify, StatusClass};
pub use config::SessionConfig;
pub use drift::{DriftCoordinator, DriftNode, DriftView};
pub use engine::{DestroyInstancePayload, DestroyStartResponse, EngineClient};
pub use errors::{ConfigError, ConfigResult, DestroyError, EngineError, EngineResult};
pub use events::{BlueprintInstanceEvent, DestroyEvent, FinishMessage, StreamFailure};
pub use finalize::{finalize, FinalizeReport};
pub use items::{DestroyItem, ItemAction, ItemHandle, ItemKind, ItemRegistry};
pub use paths::{PathBuilder, ResolvedPath};
pub use processor::{EventProcessor, ProcessOutcome};
pub use results::{collect_results, DestroyResults, ElementFailure, ElementResult};
pub use session::{
    reduce, replay, spawn_session, DestroySummary, Effect, Msg, SessionHandle, SessionState,
    SessionView,
};
pub use state_machine::{SessionPhase, StateMachine, TransitionError};
