// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finalization Policy
//!
//! Settles the items a destroy left behind when it stopped early:
//!
//! ```text
//! pending      -> skipped = true          (never started)
//! in-progress  -> kind-specific interrupted status
//! ```
//!
//! Both passes cover the whole registry, including items nested inside
//! children that only exist because of a change document. Items planned as
//! `no-change` are left alone.

use serde::Serialize;
use tracing::debug;

use crate::classify::StatusClass;
use crate::items::{DestroyItem, ItemAction, ItemRegistry};

/// Counts of items touched by a finalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeReport {
    pub skipped: usize,
    pub interrupted: usize,
}

impl FinalizeReport {
    pub fn is_empty(&self) -> bool {
        self.skipped == 0 && self.interrupted == 0
    }
}

/// Mark pending items skipped and in-progress items interrupted
pub fn finalize(registry: &mut ItemRegistry) -> FinalizeReport {
    let mut report = FinalizeReport::default();

    for item in registry.iter_mut() {
        if item.action() == ItemAction::NoChange {
            continue;
        }
        match item.class() {
            StatusClass::Pending => {
                if !item.is_skipped() {
                    item.header_mut().skipped = true;
                    report.skipped += 1;
                }
            }
            StatusClass::InProgress => {
                item.mark_interrupted();
                report.interrupted += 1;
            }
            _ => {}
        }
    }

    debug!(
        skipped = report.skipped,
        interrupted = report.interrupted,
        "finalized destroy items"
    );
    report
}

/// `true` when an item is in a state finalization leaves it in: skipped
/// while pending, interrupted, or terminally succeeded or failed.
pub fn is_settled(item: &DestroyItem) -> bool {
    if item.action() == ItemAction::NoChange {
        return true;
    }
    match item.class() {
        StatusClass::Pending => item.is_skipped(),
        StatusClass::InProgress => false,
        StatusClass::Failed | StatusClass::Interrupted | StatusClass::Succeeded => true,
        StatusClass::Unclassified => true,
    }
}
