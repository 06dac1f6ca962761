//! # agricheck-core
//!
//! Pure logic for the Agricheck inspection-checklist generator - THE LOGIC.
//!
//! The binary fetches one flat result set describing the whole inspection
//! taxonomy. This crate turns that result set into a hierarchy and answers
//! every question the selector and the checklist ask of it.
//!
//! ## Pipeline
//!
//! ```text
//! SPARQL JSON ──▶ sparql::rows_from_results ──▶ materializer::materialize ──▶ NodeMap
//!                                                                              │
//!          ┌──────────────────────────┬───────────────────────┬───────────────┤
//!          ▼                          ▼                       ▼               ▼
//!   hierarchy::build_tree    selection::Selection    collector::collect   checklist::build
//!   hierarchy::search_tree   compressor::compress
//! ```
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network, NO logging dependencies
//! - A `NodeMap` is an immutable snapshot; nothing mutates it after
//!   materialization
//! - Unresolvable references are skipped, never errors

// =============================================================================
// MODULES
// =============================================================================

pub mod checklist;
pub mod collector;
pub mod compressor;
pub mod hierarchy;
pub mod materializer;
pub mod primitives;
pub mod selection;
pub mod sparql;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AgricheckError, COLLECTION_MARKER, Node, NodeId, NodeKind, NodeMap, Row};

// =============================================================================
// RE-EXPORTS: Transforms
// =============================================================================

pub use checklist::{Checklist, ChecklistItem, Section, build_checklist};
pub use collector::{collect_all, collect_inspection_points};
pub use compressor::{compress, has_selected_ancestor};
pub use hierarchy::{SearchHits, TreeNode, breadcrumbs, build_tree, roots, search_tree};
pub use materializer::{Materializer, materialize};
pub use selection::{Selection, encode_groups, parse_groups_param, parse_groups_query};
pub use sparql::{SparqlResults, hierarchy_query, rows_from_results};

/// Parse a SPARQL JSON document and materialize it in one step.
pub fn snapshot_from_results(results: &SparqlResults) -> Result<NodeMap, AgricheckError> {
    materialize(&rows_from_results(results))
}
