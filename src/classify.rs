// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy Status Classification
//!
//! Maps raw engine statuses to the lifecycle class a destroy cares about.
//! Classification is per entity kind and deliberately discontinuous: a
//! resource whose destroy was rolled back (`RollbackComplete`) counts as
//! settled successfully, while a child or link in `DestroyRollbackComplete`
//! did not get destroyed and counts as failed.
//!
//! Every status maps to exactly one [`StatusClass`] through an exhaustive
//! match, so the classes are disjoint by construction and a new status
//! variant fails to compile until it is classified.

use crate::domain::{
    InstanceStatus, LinkStage, LinkStatus, PreciseLinkStatus, PreciseResourceStatus,
    ResourceStatus,
};

/// Lifecycle class of an item in a destroy operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// Not started yet
    Pending,
    /// Currently being destroyed or rolled back
    InProgress,
    /// Terminal failure
    Failed,
    /// Was in flight when the operation stopped
    Interrupted,
    /// Terminal success
    Succeeded,
    /// Not meaningful for a destroy
    Unclassified,
}

impl StatusClass {
    /// Single-character marker for plain-text rendering
    pub fn symbol(&self) -> char {
        match self {
            Self::Pending => '○',
            Self::InProgress => '◐',
            Self::Failed => '✗',
            Self::Interrupted => '⚠',
            Self::Succeeded => '✓',
            Self::Unclassified => '?',
        }
    }

    /// `true` for classes no further event is expected to change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Interrupted | Self::Succeeded)
    }
}

/// Status that can be classified for a destroy
pub trait Classify {
    fn class(&self) -> StatusClass;

    fn is_pending(&self) -> bool {
        self.class() == StatusClass::Pending
    }

    fn is_in_progress(&self) -> bool {
        self.class() == StatusClass::InProgress
    }

    fn is_failed(&self) -> bool {
        self.class() == StatusClass::Failed
    }

    fn is_interrupted(&self) -> bool {
        self.class() == StatusClass::Interrupted
    }

    fn is_succeeded(&self) -> bool {
        self.class() == StatusClass::Succeeded
    }
}

impl Classify for ResourceStatus {
    fn class(&self) -> StatusClass {
        use ResourceStatus::*;

        match self {
            Unknown => StatusClass::Pending,
            Destroying | RollingBack => StatusClass::InProgress,
            DestroyFailed | RollbackFailed => StatusClass::Failed,
            DestroyInterrupted | CreateInterrupted | UpdateInterrupted => {
                StatusClass::Interrupted
            }
            Destroyed | RollbackComplete => StatusClass::Succeeded,
            Creating | Created | CreateFailed | Updating | Updated | UpdateFailed => {
                StatusClass::Unclassified
            }
        }
    }
}

impl Classify for InstanceStatus {
    fn class(&self) -> StatusClass {
        use InstanceStatus::*;

        match self {
            Preparing | Unknown => StatusClass::Pending,
            Destroying | DestroyRollingBack => StatusClass::InProgress,
            DestroyFailed | DestroyRollbackFailed | DestroyRollbackComplete => StatusClass::Failed,
            DestroyInterrupted | DeployInterrupted | UpdateInterrupted => StatusClass::Interrupted,
            Destroyed => StatusClass::Succeeded,
            Deploying | Deployed | DeployFailed | DeployRollingBack | DeployRollbackFailed
            | DeployRollbackComplete | Updating | Updated | UpdateFailed | UpdateRollingBack
            | UpdateRollbackFailed | UpdateRollbackComplete | NotDeployed => {
                StatusClass::Unclassified
            }
        }
    }
}

impl Classify for LinkStatus {
    fn class(&self) -> StatusClass {
        use LinkStatus::*;

        match self {
            Unknown => StatusClass::Pending,
            Destroying | DestroyRollingBack => StatusClass::InProgress,
            DestroyFailed | DestroyRollbackFailed | DestroyRollbackComplete => StatusClass::Failed,
            DestroyInterrupted | CreateInterrupted | UpdateInterrupted => StatusClass::Interrupted,
            Destroyed => StatusClass::Succeeded,
            Creating | Created | CreateFailed | Updating | Updated | UpdateFailed
            | CreateRollingBack | CreateRollbackFailed | CreateRollbackComplete
            | UpdateRollingBack | UpdateRollbackFailed | UpdateRollbackComplete => {
                StatusClass::Unclassified
            }
        }
    }
}

/// `true` when an instance-level status shows the destroy is rolling back
/// or has already failed.
pub fn is_rolling_back_or_failed(status: InstanceStatus) -> bool {
    matches!(
        status,
        InstanceStatus::DestroyRollingBack
            | InstanceStatus::DestroyFailed
            | InstanceStatus::DestroyRollbackFailed
            | InstanceStatus::DestroyRollbackComplete
            | InstanceStatus::DestroyInterrupted
    )
}

/// Status pair a resource is forced into when interrupted
pub fn interrupted_resource_status() -> (ResourceStatus, PreciseResourceStatus) {
    (
        ResourceStatus::DestroyInterrupted,
        PreciseResourceStatus::DestroyInterrupted,
    )
}

/// Status a child is forced into when interrupted
pub fn interrupted_child_status() -> InstanceStatus {
    InstanceStatus::DestroyInterrupted
}

/// Status pair a link is forced into when interrupted.
///
/// The precise status records the stage that was active; a link with no
/// known stage is attributed to its intermediary resources.
pub fn interrupted_link_status(current: PreciseLinkStatus) -> (LinkStatus, PreciseLinkStatus) {
    let precise = match current.stage() {
        LinkStage::ResourceA => PreciseLinkStatus::ResourceAUpdateInterrupted,
        LinkStage::ResourceB => PreciseLinkStatus::ResourceBUpdateInterrupted,
        LinkStage::Intermediaries | LinkStage::Unknown => {
            PreciseLinkStatus::IntermediaryResourceUpdateInterrupted
        }
    };
    (LinkStatus::DestroyInterrupted, precise)
}
