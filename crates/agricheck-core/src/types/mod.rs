//! # Core Type Definitions
//!
//! This module contains all core types for the Agricheck taxonomy snapshot:
//! - Node identifiers (`NodeId`) and kinds (`NodeKind`)
//! - The materialized `Node` and the `NodeMap` snapshot
//! - The typed query `Row`
//! - Error types (`AgricheckError`)
//!
//! ## Determinism Guarantees
//!
//! All collections in this module are `BTreeMap`/`BTreeSet` backed or sorted
//! `Vec`s, so iteration order never depends on the order rows arrived in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Opaque identifier of a taxonomy entity (an IRI in the source graph).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new identifier from any string-like value.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing path segment of the IRI.
    ///
    /// `https://example.org/inspection/A-12` yields `A-12`. An identifier
    /// without any `/` is returned whole.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// Marker searched for in the declared type IRI to recognise a Collection.
pub const COLLECTION_MARKER: &str = "Collection";

/// The two entity kinds of the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Internal grouping node.
    Collection,
    /// Leaf checklist item.
    InspectionPoint,
}

impl NodeKind {
    /// Derive the kind from a declared type IRI.
    ///
    /// Anything containing [`COLLECTION_MARKER`] is a Collection; everything
    /// else, including a missing type, is an InspectionPoint.
    #[must_use]
    pub fn from_type_iri(type_iri: Option<&str>) -> Self {
        match type_iri {
            Some(t) if t.contains(COLLECTION_MARKER) => Self::Collection,
            _ => Self::InspectionPoint,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collection => "Collection",
            Self::InspectionPoint => "InspectionPoint",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A materialized taxonomy entity.
///
/// Child lists are deduplicated and sorted. `parent` is the single logical
/// parent, whichever of the two upstream parent predicates declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u32>,
    #[serde(default)]
    pub sub_groups: Vec<NodeId>,
    #[serde(default)]
    pub inspection_points: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    /// Create a node with empty defaults.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: None,
            comment: None,
            hierarchy_level: None,
            sub_groups: Vec::new(),
            inspection_points: Vec::new(),
            parent: None,
        }
    }

    /// The label, or the slug of the id when no label was declared.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.slug())
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.kind == NodeKind::Collection
    }
}

// =============================================================================
// NODE MAP
// =============================================================================

/// Immutable snapshot of the taxonomy, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMap {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeMap {
    /// Wrap an already-built node table.
    #[must_use]
    pub fn from_nodes(nodes: BTreeMap<NodeId, Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node, failing with `NodeNotFound`.
    pub fn require(&self, id: &NodeId) -> Result<&Node, AgricheckError> {
        self.nodes
            .get(id)
            .ok_or_else(|| AgricheckError::NodeNotFound(id.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Number of nodes of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }
}

// =============================================================================
// ROW
// =============================================================================

/// One result row of the hierarchy query.
///
/// Every field is optional on the wire. `subject` is mandatory for the
/// materializer, which rejects rows lacking it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub subject: Option<String>,
    pub subject_type: Option<String>,
    pub subject_label: Option<String>,
    pub subject_comment: Option<String>,
    pub hierarchy_level: Option<String>,
    pub sub_group: Option<String>,
    pub sub_group_label: Option<String>,
    pub sub_group_comment: Option<String>,
    /// Parent via `schema:isPartOf`.
    pub super_group: Option<String>,
    pub inspection_point: Option<String>,
    pub inspection_point_label: Option<String>,
    pub inspection_point_comment: Option<String>,
    /// Parent via `:belongsToGroup`.
    pub parent_group: Option<String>,
}

impl Row {
    /// Start a row for the given subject and type.
    #[must_use]
    pub fn subject(id: impl Into<String>, type_iri: impl Into<String>) -> Self {
        Self {
            subject: Some(id.into()),
            subject_type: Some(type_iri.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.subject_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.subject_comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_sub_group(mut self, id: impl Into<String>, label: Option<&str>) -> Self {
        self.sub_group = Some(id.into());
        self.sub_group_label = label.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_inspection_point(mut self, id: impl Into<String>, label: Option<&str>) -> Self {
        self.inspection_point = Some(id.into());
        self.inspection_point_label = label.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_super_group(mut self, id: impl Into<String>) -> Self {
        self.super_group = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_parent_group(mut self, id: impl Into<String>) -> Self {
        self.parent_group = Some(id.into());
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Agricheck system.
///
/// - Core transforms only raise on structurally invalid input
/// - Unresolvable references are soft misses, not errors
/// - The CORE never panics
#[derive(Debug, Error)]
pub enum AgricheckError {
    /// A query row did not carry the mandatory subject id.
    #[error("Malformed row {index}: missing subject id")]
    MalformedRow { index: usize },

    /// The requested node was not found in the snapshot.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The checklist groups parameter was missing or unusable.
    #[error("Invalid groups parameter: {0}")]
    InvalidGroups(String),

    /// A language tag that cannot be spliced into the query.
    #[error("Invalid language tag: {0:?}")]
    InvalidLanguage(String),

    /// The query endpoint could not be reached or answered with a failure.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
