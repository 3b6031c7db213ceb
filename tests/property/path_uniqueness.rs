// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Item Paths
//!
//! For any acyclic set of parent/child instance edges, every (instance,
//! item name) pair maps to its own path, whatever order the edges are
//! learned in.

use std::collections::HashMap;

use blueprint_destroy::paths::PathBuilder;
use proptest::prelude::*;

const ROOT: &str = "inst-0";
const ITEM_NAMES: [&str; 3] = ["db", "vpc", "ordersFn"];

/// (child instance ID, child name, parent instance ID)
type Edge = (String, String, String);

// ============================================================================
// Strategies
// ============================================================================

/// Parent index of every child instance; instance 0 is the root
fn parent_indices() -> impl Strategy<Value = Vec<usize>> {
    (1usize..12).prop_flat_map(|children| (0..children).map(|i| 0..=i).collect::<Vec<_>>())
}

/// Edges with names unique among siblings but repeated across parents
fn edges_from(parents: &[usize]) -> Vec<Edge> {
    let mut sibling_counts: HashMap<usize, usize> = HashMap::new();
    parents
        .iter()
        .enumerate()
        .map(|(i, parent)| {
            let sibling = sibling_counts.entry(*parent).or_default();
            let name = format!("c{sibling}");
            *sibling += 1;
            (format!("inst-{}", i + 1), name, format!("inst-{parent}"))
        })
        .collect()
}

/// Edges in creation order and in a shuffled order
fn edge_orders() -> impl Strategy<Value = (Vec<Edge>, Vec<Edge>)> {
    parent_indices().prop_flat_map(|parents| {
        let edges = edges_from(&parents);
        (Just(edges.clone()), Just(edges).prop_shuffle())
    })
}

fn tracked(edges: &[Edge]) -> PathBuilder {
    let mut paths = PathBuilder::new(ROOT);
    for (child, name, parent) in edges {
        paths.track_child(child, name, parent);
    }
    paths
}

fn instance_ids(edges: &[Edge]) -> Vec<String> {
    std::iter::once(ROOT.to_string())
        .chain(edges.iter().map(|(child, _, _)| child.clone()))
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: distinct items never share a path
    #[test]
    fn prop_item_paths_are_unique((_, shuffled) in edge_orders()) {
        let paths = tracked(&shuffled);
        let mut seen: HashMap<String, (String, &str)> = HashMap::new();

        for instance in instance_ids(&shuffled) {
            for name in ITEM_NAMES {
                let resolved = paths.resolve_item_path(&instance, name);
                prop_assert!(resolved.complete, "every instance is reachable from the root");
                if let Some(previous) = seen.insert(resolved.path.clone(), (instance.clone(), name)) {
                    prop_assert!(false, "{:?} and {:?} share {}", previous, (&instance, name), resolved.path);
                }
            }
        }
    }

    /// Property: the order edges are learned in does not change any path
    #[test]
    fn prop_paths_are_order_independent((ordered, shuffled) in edge_orders()) {
        let in_order = tracked(&ordered);
        let out_of_order = tracked(&shuffled);

        for instance in instance_ids(&ordered) {
            prop_assert_eq!(
                in_order.build_item_path(&instance, "db"),
                out_of_order.build_item_path(&instance, "db")
            );
        }
    }

    /// Property: re-learning a known edge reports nothing new
    #[test]
    fn prop_known_edges_are_not_new((ordered, _) in edge_orders()) {
        let mut paths = tracked(&ordered);
        for (child, name, parent) in &ordered {
            prop_assert!(!paths.track_child(child, name, parent));
        }
    }
}
