//! # Hierarchy Module
//!
//! Read-only views over a [`NodeMap`] used by the selector:
//! root discovery, breadcrumbs, the collection tree and tree search.
//!
//! Every walk carries a visited set; the snapshot may contain cycles.

use crate::{Node, NodeId, NodeMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// ROOTS & BREADCRUMBS
// =============================================================================

/// Collections without a parent, ordered by display label then id.
#[must_use]
pub fn roots(nodes: &NodeMap) -> Vec<&Node> {
    let mut roots: Vec<&Node> = nodes
        .nodes()
        .filter(|n| n.is_collection() && n.parent.is_none())
        .collect();
    roots.sort_by(|a, b| {
        a.display_label()
            .cmp(b.display_label())
            .then_with(|| a.id.cmp(&b.id))
    });
    roots
}

/// Label trail from the topmost reachable ancestor down to `id`.
///
/// Unknown ids yield an empty trail.
#[must_use]
pub fn breadcrumbs(id: &NodeId, nodes: &NodeMap) -> Vec<String> {
    let mut trail = Vec::new();
    let mut visited = BTreeSet::new();
    let mut current = Some(id);

    while let Some(cur) = current {
        if !visited.insert(cur) {
            break;
        }
        let Some(node) = nodes.get(cur) else {
            break;
        };
        trail.push(node.display_label().to_string());
        current = node.parent.as_ref();
    }

    trail.reverse();
    trail
}

// =============================================================================
// SELECTOR TREE
// =============================================================================

/// One collection in the selector tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub text: String,
    /// Lowercased text matched by search: own label and comment plus the
    /// labels and comments of the direct inspection points.
    pub search: String,
    /// Number of inspection points anywhere below this collection.
    pub point_count: usize,
    pub children: Vec<TreeNode>,
}

fn search_text(node: &Node, nodes: &NodeMap) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(node.label.as_deref());
    parts.extend(node.comment.as_deref());
    for ip in node.inspection_points.iter().filter_map(|id| nodes.get(id)) {
        parts.extend(ip.label.as_deref());
        parts.extend(ip.comment.as_deref());
    }
    parts.join(" ").to_lowercase()
}

fn build_subtree<'a>(
    node: &'a Node,
    nodes: &'a NodeMap,
    path: &mut Vec<&'a NodeId>,
) -> TreeNode {
    path.push(&node.id);
    let mut children = Vec::new();
    for child in node.sub_groups.iter().filter_map(|id| nodes.get(id)) {
        if child.is_collection() && !path.contains(&&child.id) {
            children.push(build_subtree(child, nodes, path));
        }
    }
    path.pop();

    let point_count = node.inspection_points.len()
        + children.iter().map(|c| c.point_count).sum::<usize>();

    TreeNode {
        id: node.id.clone(),
        text: node.display_label().to_string(),
        search: search_text(node, nodes),
        point_count,
        children,
    }
}

/// Build the collection tree, one entry per root.
///
/// A collection that reappears on its own ancestor path is cut off there.
#[must_use]
pub fn build_tree(nodes: &NodeMap) -> Vec<TreeNode> {
    roots(nodes)
        .into_iter()
        .map(|root| build_subtree(root, nodes, &mut Vec::new()))
        .collect()
}

// =============================================================================
// SEARCH
// =============================================================================

/// Result of a tree search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHits {
    /// Collections whose search text contains the query, in tree order.
    pub hits: Vec<NodeId>,
    /// Ancestors that must be expanded to reveal every hit.
    pub open: BTreeSet<NodeId>,
}

impl SearchHits {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

fn search_into<'a>(
    tree: &'a TreeNode,
    needle: &str,
    ancestors: &mut Vec<&'a NodeId>,
    out: &mut SearchHits,
) {
    if tree.search.contains(needle) {
        out.hits.push(tree.id.clone());
        out.open.extend(ancestors.iter().map(|id| (*id).clone()));
    }
    ancestors.push(&tree.id);
    for child in &tree.children {
        search_into(child, needle, ancestors, out);
    }
    ancestors.pop();
}

/// Case-insensitive substring search over the tree. Blank queries match
/// nothing.
#[must_use]
pub fn search_tree(trees: &[TreeNode], query: &str) -> SearchHits {
    let needle = query.trim().to_lowercase();
    let mut out = SearchHits::default();
    if needle.is_empty() {
        return out;
    }
    for tree in trees {
        search_into(tree, &needle, &mut Vec::new(), &mut out);
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
