//! # Materializer Module
//!
//! Turns flat hierarchy-query rows into a [`NodeMap`].
//!
//! - One logical entity may be spread over many rows
//! - Rows may arrive in any order
//! - Every referenced id ends up as a key, created with defaults if needed
//! - No cycle detection; traversals guard themselves
//!
//! ## Conflicting attributes
//!
//! Label, comment and hierarchy level follow "first value wins": a later row
//! never overwrites a value that is already set, but may fill one that is
//! still absent (for example a node first created as someone's child without
//! a label). Kind is fixed at first sight. Parent follows "last declared
//! wins"; within one row `super_group` is applied before `parent_group`.
//!
//! A collection that never declares a parent still gets one from the rows
//! that list it as a sub-group. With several such owners the smallest id is
//! taken, so the result does not depend on row order. Inspection points keep
//! no parent; they are reached through their owner's point list.

use crate::{AgricheckError, Node, NodeId, NodeKind, NodeMap, Row};
use std::collections::{BTreeMap, BTreeSet};

/// Mutable per-node state while rows are being consumed.
#[derive(Debug)]
struct Draft {
    kind: NodeKind,
    label: Option<String>,
    comment: Option<String>,
    hierarchy_level: Option<u32>,
    sub_groups: BTreeSet<NodeId>,
    inspection_points: BTreeSet<NodeId>,
    parent: Option<NodeId>,
    /// Subjects that list this node as a sub-group.
    owners: BTreeSet<NodeId>,
}

impl Draft {
    fn new(kind: NodeKind, label: Option<&String>, comment: Option<&String>) -> Self {
        Self {
            kind,
            label: label.cloned(),
            comment: comment.cloned(),
            hierarchy_level: None,
            sub_groups: BTreeSet::new(),
            inspection_points: BTreeSet::new(),
            parent: None,
            owners: BTreeSet::new(),
        }
    }

    /// Fill label/comment only where still absent.
    fn fill(&mut self, label: Option<&String>, comment: Option<&String>) {
        if self.label.is_none() {
            self.label = label.cloned();
        }
        if self.comment.is_none() {
            self.comment = comment.cloned();
        }
    }
}

/// Incremental row consumer. Use [`materialize`] for the one-shot form.
#[derive(Debug, Default)]
pub struct Materializer {
    drafts: BTreeMap<NodeId, Draft>,
    rows_seen: usize,
}

impl Materializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows consumed so far.
    #[must_use]
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    /// Resolve a node, creating it on first sight. Existing nodes keep their
    /// kind and only gain attributes they do not have yet.
    fn touch(
        &mut self,
        id: &str,
        kind: NodeKind,
        label: Option<&String>,
        comment: Option<&String>,
    ) -> NodeId {
        let id = NodeId::new(id);
        self.drafts
            .entry(id.clone())
            .and_modify(|d| d.fill(label, comment))
            .or_insert_with(|| Draft::new(kind, label, comment));
        id
    }

    /// Consume one row.
    ///
    /// `index` is the row's position in the input and is only used to
    /// identify the row in the error.
    pub fn ingest_row(&mut self, index: usize, row: &Row) -> Result<(), AgricheckError> {
        let subject = row
            .subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AgricheckError::MalformedRow { index })?;

        let kind = NodeKind::from_type_iri(row.subject_type.as_deref());
        let subject_id = self.touch(
            subject,
            kind,
            row.subject_label.as_ref(),
            row.subject_comment.as_ref(),
        );

        let level = row
            .hierarchy_level
            .as_deref()
            .and_then(|l| l.trim().parse::<u32>().ok());

        let sub_group = row.sub_group.as_deref().map(|child| {
            self.touch(
                child,
                NodeKind::Collection,
                row.sub_group_label.as_ref(),
                row.sub_group_comment.as_ref(),
            )
        });

        let inspection_point = row.inspection_point.as_deref().map(|child| {
            self.touch(
                child,
                NodeKind::InspectionPoint,
                row.inspection_point_label.as_ref(),
                row.inspection_point_comment.as_ref(),
            )
        });

        // Both parent predicates are synonyms; the later one on the row wins.
        let mut parent = None;
        for declared in [row.super_group.as_deref(), row.parent_group.as_deref()]
            .into_iter()
            .flatten()
        {
            parent = Some(self.touch(declared, NodeKind::Collection, None, None));
        }

        if let Some(child) = sub_group
            .as_ref()
            .filter(|c| **c != subject_id)
            .and_then(|c| self.drafts.get_mut(c))
        {
            child.owners.insert(subject_id.clone());
        }

        if let Some(draft) = self.drafts.get_mut(&subject_id) {
            if draft.hierarchy_level.is_none() {
                draft.hierarchy_level = level;
            }
            if let Some(child) = sub_group {
                draft.sub_groups.insert(child);
            }
            if let Some(child) = inspection_point {
                draft.inspection_points.insert(child);
            }
            if parent.is_some() {
                draft.parent = parent;
            }
        }

        self.rows_seen += 1;
        Ok(())
    }

    /// Freeze the drafts into an immutable snapshot.
    #[must_use]
    pub fn finish(self) -> NodeMap {
        let nodes = self
            .drafts
            .into_iter()
            .map(|(id, mut d)| {
                let parent = d.parent.or_else(|| d.owners.pop_first());
                let node = Node {
                    id: id.clone(),
                    kind: d.kind,
                    label: d.label,
                    comment: d.comment,
                    hierarchy_level: d.hierarchy_level,
                    sub_groups: d.sub_groups.into_iter().collect(),
                    inspection_points: d.inspection_points.into_iter().collect(),
                    parent,
                };
                (id, node)
            })
            .collect();
        NodeMap::from_nodes(nodes)
    }
}

/// Materialize a full row sequence into a node snapshot.
///
/// Fails fast with `MalformedRow` on the first row without a subject id.
pub fn materialize(rows: &[Row]) -> Result<NodeMap, AgricheckError> {
    let mut materializer = Materializer::new();
    for (index, row) in rows.iter().enumerate() {
        materializer.ingest_row(index, row)?;
    }
    Ok(materializer.finish())
}

// =============================================================================
// TESTS
// =============================================================================
