//! # Checklist Module
//!
//! Assembles the printable checklist for a list of selected groups.
//!
//! Output is raw structure only: numbered sections in document order, each
//! with its resolvable inspection points. Formatting lives in the binary.
//!
//! ## Numbering
//!
//! The i-th requested group is section `i`; the j-th listed sub-group of
//! section `n` is `n.j`. Unknown ids and non-Collection ids are skipped but
//! keep their position, so a link always numbers a group the same way.

use crate::primitives::MAX_HEADING_LEVEL;
use crate::{Node, NodeId, NodeMap};
use serde::{Deserialize, Serialize};

/// One tickable line of the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: NodeId,
    pub label: String,
    pub comment: Option<String>,
}

/// One collection heading with its own inspection points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: NodeId,
    /// Hierarchical section number, e.g. `[2, 1]` for "2.1".
    pub number: Vec<usize>,
    pub title: String,
    pub comment: Option<String>,
    pub items: Vec<ChecklistItem>,
}

impl Section {
    /// Dotted section number, e.g. `2.1`.
    #[must_use]
    pub fn number_label(&self) -> String {
        self.number
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Nesting depth, 1 for a selected group.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.number.len()
    }

    /// HTML heading level, capped at `h6`.
    #[must_use]
    pub fn heading_level(&self) -> usize {
        self.depth().clamp(1, MAX_HEADING_LEVEL)
    }
}

/// A fully assembled checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub sections: Vec<Section>,
    /// Requested groups that were not present as Collections.
    pub missing: Vec<NodeId>,
}

impl Checklist {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of tickable items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

fn item_for(id: &NodeId, nodes: &NodeMap) -> Option<ChecklistItem> {
    nodes.get(id).map(|ip| ChecklistItem {
        id: id.clone(),
        label: ip.display_label().to_string(),
        comment: ip.comment.clone(),
    })
}

fn push_section<'a>(
    node: &'a Node,
    number: Vec<usize>,
    nodes: &'a NodeMap,
    path: &mut Vec<&'a NodeId>,
    out: &mut Vec<Section>,
) {
    out.push(Section {
        id: node.id.clone(),
        number: number.clone(),
        title: node.display_label().to_string(),
        comment: node.comment.clone(),
        items: node
            .inspection_points
            .iter()
            .filter_map(|id| item_for(id, nodes))
            .collect(),
    });

    path.push(&node.id);
    for (position, id) in node.sub_groups.iter().enumerate() {
        let Some(child) = nodes.get(id) else {
            continue;
        };
        if !child.is_collection() || path.contains(&&child.id) {
            continue;
        }
        let mut child_number = number.clone();
        child_number.push(position + 1);
        push_section(child, child_number, nodes, path, out);
    }
    path.pop();
}

/// Build the checklist for `groups`, in the given order.
#[must_use]
pub fn build_checklist(groups: &[NodeId], nodes: &NodeMap) -> Checklist {
    let mut checklist = Checklist::default();

    for (position, id) in groups.iter().enumerate() {
        match nodes.get(id).filter(|n| n.is_collection()) {
            Some(node) => {
                push_section(
                    node,
                    vec![position + 1],
                    nodes,
                    &mut Vec::new(),
                    &mut checklist.sections,
                );
            }
            None => checklist.missing.push(id.clone()),
        }
    }

    checklist
}

// =============================================================================
// TESTS
// =============================================================================
