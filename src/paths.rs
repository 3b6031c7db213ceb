// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hierarchical Item Paths
//!
//! Events only identify the instance that owns an item, never the chain of
//! child blueprints above it. [`PathBuilder`] records every parent/child
//! instance edge it is told about and derives stable, slash-joined paths:
//!
//! ```text
//! root instance          db           -> "db"
//! child "network"        vpc          -> "network/vpc"
//! grandchild "subnets"   subnetA      -> "network/subnets/subnetA"
//! ```
//!
//! An instance whose ancestry is not (yet) fully known yields a partial path.
//! This is not an error; the result says whether the chain reached the root
//! so callers can treat the path as provisional.

use std::collections::{HashMap, HashSet};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '/';

/// A path derived for an item together with whether its ancestry is complete
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    pub path: String,
    /// `false` when an unknown instance truncated the ancestor chain
    pub complete: bool,
}

impl ResolvedPath {
    /// Path of an item owned directly by the root instance
    pub fn root(name: &str) -> Self {
        Self {
            path: name.to_string(),
            complete: true,
        }
    }

    /// Path of an item nested under a known parent path
    pub fn nested(parent_path: &str, name: &str) -> Self {
        Self {
            path: join_path(parent_path, name),
            complete: true,
        }
    }

    /// Number of child blueprints above the item
    pub fn depth(&self) -> usize {
        path_depth(&self.path)
    }

    /// Path of the child blueprint that owns the item, if any
    pub fn parent_path(&self) -> Option<&str> {
        parent_path(&self.path)
    }
}

/// Join a parent path and a name; an empty parent yields the bare name
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    }
}

/// Number of separators in a path
pub fn path_depth(path: &str) -> usize {
    path.matches(PATH_SEPARATOR).count()
}

/// Everything before the last separator
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}

/// Instance ID → (name, parent) mappings for one destroy session
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    root_instance_id: String,
    names: HashMap<String, String>,
    parents: HashMap<String, String>,
}

impl PathBuilder {
    pub fn new(root_instance_id: impl Into<String>) -> Self {
        Self {
            root_instance_id: root_instance_id.into(),
            ..Default::default()
        }
    }

    /// Set the root instance once the engine has assigned it
    pub fn set_root(&mut self, root_instance_id: impl Into<String>) {
        self.root_instance_id = root_instance_id.into();
    }

    pub fn root_instance_id(&self) -> &str {
        &self.root_instance_id
    }

    /// An empty instance ID refers to the root
    pub fn is_root(&self, instance_id: &str) -> bool {
        instance_id.is_empty() || instance_id == self.root_instance_id
    }

    /// `true` when the instance is the root or a tracked child
    pub fn is_known(&self, instance_id: &str) -> bool {
        self.is_root(instance_id) || self.names.contains_key(instance_id)
    }

    /// Record a parent/child instance edge.
    ///
    /// Returns `true` when the edge was not known before. Empty IDs or names
    /// are ignored.
    pub fn track_child(&mut self, child_instance_id: &str, child_name: &str, parent_instance_id: &str) -> bool {
        if child_instance_id.is_empty() || child_name.is_empty() || parent_instance_id.is_empty() {
            return false;
        }

        let name_changed = self
            .names
            .insert(child_instance_id.to_string(), child_name.to_string())
            .as_deref()
            != Some(child_name);
        let parent_changed = self
            .parents
            .insert(child_instance_id.to_string(), parent_instance_id.to_string())
            .as_deref()
            != Some(parent_instance_id);

        name_changed || parent_changed
    }

    /// Path of a child blueprint owned by `parent_instance_id`
    pub fn build_instance_path(&self, parent_instance_id: &str, child_name: &str) -> String {
        self.resolve_item_path(parent_instance_id, child_name).path
    }

    /// Path of a resource or link owned by `instance_id`
    pub fn build_item_path(&self, instance_id: &str, item_name: &str) -> String {
        self.resolve_item_path(instance_id, item_name).path
    }

    /// Path of an item owned by `instance_id`, with completeness
    pub fn resolve_item_path(&self, instance_id: &str, item_name: &str) -> ResolvedPath {
        let (mut segments, complete) = self.ancestry(instance_id);
        segments.push(item_name);
        ResolvedPath {
            path: segments.join(&PATH_SEPARATOR.to_string()),
            complete,
        }
    }

    /// Names of the child blueprints from the root down to `instance_id`.
    ///
    /// Stops at the first instance without a recorded name; a cycle in the
    /// recorded edges is treated the same way.
    fn ancestry(&self, instance_id: &str) -> (Vec<&str>, bool) {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut current = instance_id;

        while !self.is_root(current) {
            if !visited.insert(current) {
                names.reverse();
                return (names, false);
            }
            let Some(name) = self.names.get(current) else {
                names.reverse();
                return (names, false);
            };
            names.push(name.as_str());
            match self.parents.get(current) {
                Some(parent) => current = parent.as_str(),
                None => {
                    names.reverse();
                    return (names, false);
                }
            }
        }

        names.reverse();
        (names, true)
    }
}
