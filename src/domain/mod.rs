// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine Domain Model
//!
//! Data the destroy core consumes from the deploy engine. These types are
//! owned by the engine; the core treats them as read-only input.
//!
//! - [`status`] - raw status codes per entity kind
//! - [`changes`] - staged change documents (what a changeset would do)
//! - [`instance_state`] - recorded instance snapshots
//! - [`reconciliation`] - drift check results and the payload that accepts them

pub mod changes;
pub mod instance_state;
pub mod reconciliation;
pub mod status;

pub use changes::{
    link_name, split_link_name, BlueprintChanges, Changeset, FieldChange, LinkChanges,
    NewBlueprintDefinition, ResourceChanges, LINK_NAME_SEPARATOR,
};
pub use instance_state::{BlueprintInstanceState, LinkState, ResourceState};
pub use reconciliation::{
    ApplyReconciliationPayload, IntermediaryReconcileAction, IntermediaryReconcileResult,
    LinkReconcileAction, LinkReconcileResult, ReconcileAction, ReconciliationCheckResult,
    ReconciliationType, ResourceReconcileAction, ResourceReconcileResult,
};
pub use status::{
    InstanceStatus, LinkStage, LinkStatus, PreciseLinkStatus, PreciseResourceStatus,
    ResourceStatus,
};
