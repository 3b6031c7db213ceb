// Copyright (c) 2025 - Cowboy AI, Inc.
//! Result Collector
//!
//! Walks the final item tree depth-first and files every item into one of
//! three lists. Result paths name each level by collection:
//!
//! ```text
//! resources.db
//! children.network
//! children.network::resources.vpc
//! children.network::children.subnets::resources.subnetA
//! ```
//!
//! A child's contents are visited through the change document it carries
//! (covering items that never received an event of their own) and then
//! through any other items the registry holds under the child's path.
//! Every item is visited at most once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::classify::StatusClass;
use crate::items::{level_entries, DestroyItem, ItemAction, ItemHandle, ItemKind, ItemRegistry};
use crate::paths::join_path;

/// Separator between the levels of a result path
pub const RESULT_PATH_SEPARATOR: &str = "::";

/// One element in a result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResult {
    pub path: String,
    pub name: String,
    pub element_type: String,
}

/// An element that failed, with the reasons reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFailure {
    #[serde(flatten)]
    pub element: ElementResult,
    pub failure_reasons: Vec<String>,
}

/// Destroyed, failed and interrupted elements of a destroy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyResults {
    pub destroyed_elements: Vec<ElementResult>,
    pub failed_elements: Vec<ElementFailure>,
    pub interrupted_elements: Vec<ElementResult>,
}

impl DestroyResults {
    /// Number of elements across all three lists
    pub fn len(&self) -> usize {
        self.destroyed_elements.len() + self.failed_elements.len() + self.interrupted_elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths of every filed element
    pub fn all_paths(&self) -> impl Iterator<Item = &str> {
        self.destroyed_elements
            .iter()
            .map(|e| e.path.as_str())
            .chain(self.failed_elements.iter().map(|e| e.element.path.as_str()))
            .chain(self.interrupted_elements.iter().map(|e| e.path.as_str()))
    }
}

/// Result path of an element named `name` of `kind` under `parent`
pub fn result_path(parent: &str, kind: ItemKind, name: &str) -> String {
    let segment = format!("{}.{name}", kind.collection());
    if parent.is_empty() {
        segment
    } else {
        format!("{parent}{RESULT_PATH_SEPARATOR}{segment}")
    }
}

/// Collect the result lists from the registry
pub fn collect_results(registry: &ItemRegistry) -> DestroyResults {
    let mut collector = Collector {
        registry,
        visited: HashSet::new(),
        results: DestroyResults::default(),
    };
    for handle in registry.roots() {
        collector.visit(*handle, "");
    }
    collector.results
}

struct Collector<'a> {
    registry: &'a ItemRegistry,
    visited: HashSet<ItemHandle>,
    results: DestroyResults,
}

impl Collector<'_> {
    fn visit(&mut self, handle: ItemHandle, parent_result_path: &str) {
        if !self.visited.insert(handle) {
            return;
        }
        let registry = self.registry;
        let item = registry.get(handle);
        let path = result_path(parent_result_path, item.kind(), item.name());
        self.file(item, &path);

        let DestroyItem::Child(child) = item else {
            return;
        };
        let child_path = child.header.path.as_str();

        if let Some(changes) = &child.changes {
            let owner = Some(child.child_instance_id.as_str());
            for entry in level_entries(changes) {
                let item_path = join_path(child_path, &entry.name);
                if let Some(nested) = registry.lookup(entry.kind, &item_path, owner, &entry.name) {
                    self.visit(nested, &path);
                }
            }
        }
        for nested in registry.children_of(child_path) {
            self.visit(*nested, &path);
        }
    }

    fn file(&mut self, item: &DestroyItem, path: &str) {
        if item.action() == ItemAction::NoChange {
            return;
        }
        let element = ElementResult {
            path: path.to_string(),
            name: item.name().to_string(),
            element_type: item.kind().element_type().to_string(),
        };

        match item.class() {
            StatusClass::Failed if !item.failure_reasons().is_empty() => {
                self.results.failed_elements.push(ElementFailure {
                    element,
                    failure_reasons: item.failure_reasons().to_vec(),
                });
            }
            StatusClass::Interrupted => self.results.interrupted_elements.push(element),
            StatusClass::Succeeded => self.results.destroyed_elements.push(element),
            _ if item.is_skipped() => self.results.interrupted_elements.push(element),
            _ => {}
        }
    }
}
