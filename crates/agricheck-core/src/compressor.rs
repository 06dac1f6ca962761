//! # Compressor Module
//!
//! Reduces a selection to its minimal covering set.
//!
//! Selecting a Collection implies its whole subtree, so any selected id with
//! a selected ancestor is redundant. The walk follows `parent` links only and
//! stops at a missing node, a node without parent, or a repeated id.

use crate::{NodeId, NodeMap};
use std::collections::BTreeSet;

/// Whether any ancestor of `id` (excluding `id` itself) is in `selected`.
#[must_use]
pub fn has_selected_ancestor(id: &NodeId, selected: &BTreeSet<NodeId>, nodes: &NodeMap) -> bool {
    let mut visited = BTreeSet::new();
    visited.insert(id);

    let mut current = id;
    while let Some(parent) = nodes.get(current).and_then(|n| n.parent.as_ref()) {
        if !visited.insert(parent) {
            return false;
        }
        if selected.contains(parent) {
            return true;
        }
        current = parent;
    }
    false
}

/// Remove every selected id that has a selected ancestor.
///
/// O(S × D) for S selected ids and hierarchy depth D. Inputs are left
/// untouched; the result is always a fresh set.
#[must_use]
pub fn compress(selected: &BTreeSet<NodeId>, nodes: &NodeMap) -> BTreeSet<NodeId> {
    selected
        .iter()
        .filter(|id| !has_selected_ancestor(id, selected, nodes))
        .cloned()
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
