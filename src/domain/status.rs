// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine Status Codes
//!
//! Raw status values reported by the deploy engine for each entity kind.
//! Every status travels on the wire as its integer code; codes this crate
//! does not recognise decode to the kind's `Unknown` arm instead of failing,
//! so a newer engine never breaks an older client mid-stream.
//!
//! | Kind              | Coarse            | Precise                  |
//! |-------------------|-------------------|--------------------------|
//! | Resource          | [`ResourceStatus`] | [`PreciseResourceStatus`] |
//! | Child / instance  | [`InstanceStatus`] | -                        |
//! | Link              | [`LinkStatus`]     | [`PreciseLinkStatus`]     |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a status enum together with its wire code and display label.
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal, )+
        }
        fallback = $fallback:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "u32", into = "u32")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Integer code used by the engine wire format
            pub fn code(&self) -> u32 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// Human readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<u32> for $name {
            fn from(code: u32) -> Self {
                match code {
                    $( $code => Self::$variant, )+
                    _ => Self::$fallback,
                }
            }
        }

        impl From<$name> for u32 {
            fn from(status: $name) -> Self {
                status.code()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$fallback
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

status_enum! {
    /// Coarse-grained resource status
    pub enum ResourceStatus {
        Unknown = 0 => "Unknown",
        Creating = 1 => "Creating",
        Created = 2 => "Created",
        CreateFailed = 3 => "Create Failed",
        Destroying = 4 => "Destroying",
        Destroyed = 5 => "Destroyed",
        DestroyFailed = 6 => "Destroy Failed",
        Updating = 7 => "Updating",
        Updated = 8 => "Updated",
        UpdateFailed = 9 => "Update Failed",
        RollingBack = 10 => "Rolling Back",
        RollbackFailed = 11 => "Rollback Failed",
        RollbackComplete = 12 => "Rolled Back",
        CreateInterrupted = 13 => "Create Interrupted",
        UpdateInterrupted = 14 => "Update Interrupted",
        DestroyInterrupted = 15 => "Destroy Interrupted",
    }
    fallback = Unknown;
}

status_enum! {
    /// Fine-grained resource status
    pub enum PreciseResourceStatus {
        Unknown = 0 => "Unknown",
        Creating = 1 => "Creating",
        ConfigComplete = 2 => "Config Complete",
        Created = 3 => "Created",
        CreateFailed = 4 => "Create Failed",
        CreateRollingBack = 5 => "Rolling Back Create",
        CreateRollbackFailed = 6 => "Create Rollback Failed",
        CreateRollbackComplete = 7 => "Create Rolled Back",
        Destroying = 8 => "Destroying",
        Destroyed = 9 => "Destroyed",
        DestroyFailed = 10 => "Destroy Failed",
        DestroyRollingBack = 11 => "Rolling Back Destroy",
        DestroyRollbackFailed = 12 => "Destroy Rollback Failed",
        DestroyRollbackConfigComplete = 13 => "Destroy Rollback Config Complete",
        DestroyRollbackComplete = 14 => "Destroy Rolled Back",
        Updating = 15 => "Updating",
        UpdateConfigComplete = 16 => "Update Config Complete",
        Updated = 17 => "Updated",
        UpdateFailed = 18 => "Update Failed",
        UpdateRollingBack = 19 => "Rolling Back Update",
        UpdateRollbackFailed = 20 => "Update Rollback Failed",
        UpdateRollbackConfigComplete = 21 => "Update Rollback Config Complete",
        UpdateRollbackComplete = 22 => "Update Rolled Back",
        CreateInterrupted = 23 => "Create Interrupted",
        UpdateInterrupted = 24 => "Update Interrupted",
        DestroyInterrupted = 25 => "Destroy Interrupted",
    }
    fallback = Unknown;
}

status_enum! {
    /// Blueprint instance status, shared by the root instance and child blueprints
    pub enum InstanceStatus {
        Preparing = 0 => "Preparing",
        Deploying = 1 => "Deploying",
        Deployed = 2 => "Deployed",
        DeployFailed = 3 => "Deploy Failed",
        DeployRollingBack = 4 => "Rolling Back Deploy",
        DeployRollbackFailed = 5 => "Deploy Rollback Failed",
        DeployRollbackComplete = 6 => "Deploy Rolled Back",
        Destroying = 7 => "Destroying",
        Destroyed = 8 => "Destroyed",
        DestroyFailed = 9 => "Destroy Failed",
        DestroyRollingBack = 10 => "Rolling Back Destroy",
        DestroyRollbackFailed = 11 => "Destroy Rollback Failed",
        DestroyRollbackComplete = 12 => "Destroy Rolled Back",
        Updating = 13 => "Updating",
        Updated = 14 => "Updated",
        UpdateFailed = 15 => "Update Failed",
        UpdateRollingBack = 16 => "Rolling Back Update",
        UpdateRollbackFailed = 17 => "Update Rollback Failed",
        UpdateRollbackComplete = 18 => "Update Rolled Back",
        NotDeployed = 19 => "Not Deployed",
        DeployInterrupted = 20 => "Deploy Interrupted",
        UpdateInterrupted = 21 => "Update Interrupted",
        DestroyInterrupted = 22 => "Destroy Interrupted",
        /// Code not recognised by this client
        Unknown = 4294967295 => "Unknown",
    }
    fallback = Unknown;
}

status_enum! {
    /// Coarse-grained link status
    pub enum LinkStatus {
        Unknown = 0 => "Unknown",
        Creating = 1 => "Creating",
        Created = 2 => "Created",
        CreateFailed = 3 => "Create Failed",
        Updating = 4 => "Updating",
        Updated = 5 => "Updated",
        UpdateFailed = 6 => "Update Failed",
        Destroying = 7 => "Destroying",
        Destroyed = 8 => "Destroyed",
        DestroyFailed = 9 => "Destroy Failed",
        CreateRollingBack = 10 => "Rolling Back Create",
        CreateRollbackFailed = 11 => "Create Rollback Failed",
        CreateRollbackComplete = 12 => "Create Rolled Back",
        UpdateRollingBack = 13 => "Rolling Back Update",
        UpdateRollbackFailed = 14 => "Update Rollback Failed",
        UpdateRollbackComplete = 15 => "Update Rolled Back",
        DestroyRollingBack = 16 => "Rolling Back Destroy",
        DestroyRollbackFailed = 17 => "Destroy Rollback Failed",
        DestroyRollbackComplete = 18 => "Destroy Rolled Back",
        CreateInterrupted = 19 => "Create Interrupted",
        UpdateInterrupted = 20 => "Update Interrupted",
        DestroyInterrupted = 21 => "Destroy Interrupted",
    }
    fallback = Unknown;
}

status_enum! {
    /// Fine-grained link status: which stage of the link operation is active
    pub enum PreciseLinkStatus {
        Unknown = 0 => "Unknown",
        UpdatingResourceA = 1 => "Updating Resource A",
        ResourceAUpdated = 2 => "Resource A Updated",
        ResourceAUpdateFailed = 3 => "Resource A Update Failed",
        ResourceAUpdateRollingBack = 4 => "Rolling Back Resource A",
        ResourceAUpdateRollbackFailed = 5 => "Resource A Rollback Failed",
        ResourceAUpdateRollbackComplete = 6 => "Resource A Rolled Back",
        UpdatingResourceB = 7 => "Updating Resource B",
        ResourceBUpdated = 8 => "Resource B Updated",
        ResourceBUpdateFailed = 9 => "Resource B Update Failed",
        ResourceBUpdateRollingBack = 10 => "Rolling Back Resource B",
        ResourceBUpdateRollbackFailed = 11 => "Resource B Rollback Failed",
        ResourceBUpdateRollbackComplete = 12 => "Resource B Rolled Back",
        UpdatingIntermediaryResources = 13 => "Updating Intermediary Resources",
        IntermediaryResourcesUpdated = 14 => "Intermediary Resources Updated",
        IntermediaryResourceUpdateFailed = 15 => "Intermediary Resource Update Failed",
        IntermediaryResourceUpdateRollingBack = 16 => "Rolling Back Intermediary Resources",
        IntermediaryResourceUpdateRollbackFailed = 17 => "Intermediary Resource Rollback Failed",
        IntermediaryResourceUpdateRollbackComplete = 18 => "Intermediary Resources Rolled Back",
        ResourceAUpdateInterrupted = 19 => "Resource A Update Interrupted",
        ResourceBUpdateInterrupted = 20 => "Resource B Update Interrupted",
        IntermediaryResourceUpdateInterrupted = 21 => "Intermediary Resource Update Interrupted",
    }
    fallback = Unknown;
}

impl PreciseLinkStatus {
    /// Stage of the link operation this status belongs to
    pub fn stage(&self) -> LinkStage {
        use PreciseLinkStatus::*;

        match self {
            UpdatingResourceA
            | ResourceAUpdated
            | ResourceAUpdateFailed
            | ResourceAUpdateRollingBack
            | ResourceAUpdateRollbackFailed
            | ResourceAUpdateRollbackComplete
            | ResourceAUpdateInterrupted => LinkStage::ResourceA,
            UpdatingResourceB
            | ResourceBUpdated
            | ResourceBUpdateFailed
            | ResourceBUpdateRollingBack
            | ResourceBUpdateRollbackFailed
            | ResourceBUpdateRollbackComplete
            | ResourceBUpdateInterrupted => LinkStage::ResourceB,
            UpdatingIntermediaryResources
            | IntermediaryResourcesUpdated
            | IntermediaryResourceUpdateFailed
            | IntermediaryResourceUpdateRollingBack
            | IntermediaryResourceUpdateRollbackFailed
            | IntermediaryResourceUpdateRollbackComplete
            | IntermediaryResourceUpdateInterrupted => LinkStage::Intermediaries,
            Unknown => LinkStage::Unknown,
        }
    }
}

/// Stage of a link operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    ResourceA,
    ResourceB,
    Intermediaries,
    Unknown,
}
