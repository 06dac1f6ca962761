//! # Collector Module
//!
//! Depth-first expansion of a Collection into every inspection point below it.

use crate::{NodeId, NodeMap};
use std::collections::BTreeSet;

/// Collect all inspection points under `root`, at any depth.
///
/// Each collection contributes its own points first, then those of its
/// sub-groups in order. A collection reached a second time (only possible in
/// a cyclic `sub_groups` graph) contributes nothing. Missing ids and
/// non-Collection roots yield an empty result.
#[must_use]
pub fn collect_inspection_points(root: &NodeId, nodes: &NodeMap) -> Vec<NodeId> {
    let mut visited = BTreeSet::new();
    let mut out = Vec::new();
    collect_into(root, nodes, &mut visited, &mut out);
    out
}

fn collect_into<'a>(
    id: &'a NodeId,
    nodes: &'a NodeMap,
    visited: &mut BTreeSet<&'a NodeId>,
    out: &mut Vec<NodeId>,
) {
    if !visited.insert(id) {
        return;
    }
    let Some(node) = nodes.get(id) else {
        return;
    };
    if !node.is_collection() {
        return;
    }

    out.extend(node.inspection_points.iter().cloned());
    for sub in &node.sub_groups {
        collect_into(sub, nodes, visited, out);
    }
}

/// Union of the inspection points under every id in `roots`, deduplicated.
#[must_use]
pub fn collect_all<'a>(
    roots: impl IntoIterator<Item = &'a NodeId>,
    nodes: &NodeMap,
) -> BTreeSet<NodeId> {
    roots
        .into_iter()
        .flat_map(|root| collect_inspection_points(root, nodes))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
