//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Every response except health carries
//! `success` and an optional `error` so the selector page can branch on one
//! field.

use agricheck_core::{
    AgricheckError, Checklist, NodeId, SearchHits, Selection, TreeNode,
    primitives::MAX_SEARCH_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Bare failure body, used where no richer response type applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// =============================================================================
// TREE RESPONSE
// =============================================================================

/// Selector tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    pub success: bool,
    pub roots: Vec<TreeNode>,
    pub collection_count: usize,
    pub inspection_point_count: usize,
    pub error: Option<String>,
}

impl TreeResponse {
    #[must_use]
    pub fn success(roots: Vec<TreeNode>, collection_count: usize, inspection_point_count: usize) -> Self {
        Self {
            success: true,
            roots,
            collection_count,
            inspection_point_count,
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            roots: Vec::new(),
            collection_count: 0,
            inspection_point_count: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// `GET /api/search?q=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

impl SearchParams {
    /// Reject oversized queries.
    pub fn validate(&self) -> Result<&str, AgricheckError> {
        if self.q.len() > MAX_SEARCH_LENGTH {
            return Err(AgricheckError::SerializationError(format!(
                "Search query length {} exceeds maximum {} bytes",
                self.q.len(),
                MAX_SEARCH_LENGTH
            )));
        }
        Ok(&self.q)
    }
}

/// Search result: hits plus the ancestors to expand.
///
/// `trails[i]` is the breadcrumb trail of `hits[i]`, root first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub hits: Vec<NodeId>,
    pub trails: Vec<Vec<String>>,
    pub open: BTreeSet<NodeId>,
    pub error: Option<String>,
}

impl SearchResponse {
    #[must_use]
    pub fn success(query: impl Into<String>, hits: SearchHits, trails: Vec<Vec<String>>) -> Self {
        Self {
            success: true,
            query: query.into(),
            hits: hits.hits,
            trails,
            open: hits.open,
            error: None,
        }
    }

    #[must_use]
    pub fn error(query: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.into(),
            hits: Vec::new(),
            trails: Vec::new(),
            open: BTreeSet::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// COMPRESS REQUEST/RESPONSE
// =============================================================================

/// Selection to compress into a checklist link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressRequest {
    pub selected: Vec<NodeId>,
}

impl CompressRequest {
    /// Convert to a bounded [`Selection`].
    pub fn to_selection(&self) -> Result<Selection, AgricheckError> {
        Selection::from_ids(self.selected.iter().cloned())
    }
}

/// Minimal covering selection and the link built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressResponse {
    pub success: bool,
    pub compressed: Vec<NodeId>,
    pub groups: String,
    pub link: Option<String>,
    pub error: Option<String>,
}

impl CompressResponse {
    #[must_use]
    pub fn success(compressed: &Selection, link: Option<String>) -> Self {
        Self {
            success: true,
            compressed: compressed.ids().iter().cloned().collect(),
            groups: compressed.to_groups_param(),
            link,
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            compressed: Vec::new(),
            groups: String::new(),
            link: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CHECKLIST RESPONSE
// =============================================================================

/// Expanded checklist as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistResponse {
    pub success: bool,
    pub checklist: Option<Checklist>,
    pub item_count: usize,
    pub error: Option<String>,
}

impl ChecklistResponse {
    #[must_use]
    pub fn success(checklist: Checklist) -> Self {
        Self {
            success: true,
            item_count: checklist.item_count(),
            checklist: Some(checklist),
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            checklist: None,
            item_count: 0,
            error: Some(msg.into()),
        }
    }
}
