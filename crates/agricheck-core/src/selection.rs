//! # Selection Module
//!
//! The user's checklist selection as an explicit value, plus the
//! `groups=` navigation contract between selector and checklist.
//!
//! The caller owns the mutable `Selection`; compression and link building
//! take it by reference and return new values.
//!
//! ## Navigation Contract
//!
//! `groups=<slug>,<slug>,...` where each slug is the URL-encoded trailing
//! path segment of a selected id. The checklist side splits on `,` before
//! decoding, so a `,` inside a slug survives as `%2C`.

use crate::compressor::compress;
use crate::primitives::{GROUPS_PARAM, MAX_GROUPS, MAX_SELECTION, NO_GROUPS};
use crate::{AgricheckError, NodeId, NodeMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// SELECTION STATE
// =============================================================================

/// A set of selected node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<NodeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, rejecting oversized input.
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Result<Self, AgricheckError> {
        let ids: BTreeSet<NodeId> = ids.into_iter().collect();
        if ids.len() > MAX_SELECTION {
            return Err(AgricheckError::InvalidGroups(format!(
                "selection of {} ids exceeds maximum {}",
                ids.len(),
                MAX_SELECTION
            )));
        }
        Ok(Self { ids })
    }

    /// Add an id. Returns `false` if it was already selected.
    pub fn select(&mut self, id: NodeId) -> bool {
        self.ids.insert(id)
    }

    /// Remove an id. Returns `false` if it was not selected.
    pub fn deselect(&mut self, id: &NodeId) -> bool {
        self.ids.remove(id)
    }

    /// Flip an id's membership and report whether it is now selected.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &BTreeSet<NodeId> {
        &self.ids
    }

    /// The minimal covering selection.
    #[must_use]
    pub fn compressed(&self, nodes: &NodeMap) -> Self {
        Self {
            ids: compress(&self.ids, nodes),
        }
    }

    /// Encode this selection as the `groups` parameter value, as is.
    #[must_use]
    pub fn to_groups_param(&self) -> String {
        encode_groups(&self.ids)
    }

    /// Compress, then build a `<path>?groups=...` link. `None` when nothing
    /// is selected.
    #[must_use]
    pub fn checklist_link(&self, nodes: &NodeMap, path: &str) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let minimal = self.compressed(nodes);
        Some(format!(
            "{}?{}={}",
            path,
            GROUPS_PARAM,
            minimal.to_groups_param()
        ))
    }
}

// =============================================================================
// GROUPS PARAMETER
// =============================================================================

/// Join the encoded slugs of `ids` with `,`.
#[must_use]
pub fn encode_groups<'a>(ids: impl IntoIterator<Item = &'a NodeId>) -> String {
    ids.into_iter()
        .map(|id| urlencoding::encode(id.slug()).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a raw (still percent-encoded) `groups` value into full ids.
///
/// Empty segments are ignored, duplicates keep their first position. An
/// absent or empty value is an error, so the caller can tell the user that
/// no groups were given.
pub fn parse_groups_param(raw: Option<&str>, base_iri: &str) -> Result<Vec<NodeId>, AgricheckError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AgricheckError::InvalidGroups(NO_GROUPS.to_string()))?;

    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();
    for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slug = urlencoding::decode(segment).map_err(|e| {
            AgricheckError::InvalidGroups(format!("cannot decode {:?}: {}", segment, e))
        })?;
        let id = NodeId::new(format!("{}{}", base_iri, slug));
        if seen.insert(id.clone()) {
            ids.push(id);
        }
        if ids.len() > MAX_GROUPS {
            return Err(AgricheckError::InvalidGroups(format!(
                "more than {} groups requested",
                MAX_GROUPS
            )));
        }
    }

    if ids.is_empty() {
        return Err(AgricheckError::InvalidGroups(NO_GROUPS.to_string()));
    }
    Ok(ids)
}

/// Pull the raw `groups` value out of a raw query string and decode it.
pub fn parse_groups_query(
    raw_query: Option<&str>,
    base_iri: &str,
) -> Result<Vec<NodeId>, AgricheckError> {
    let value = raw_query.and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == GROUPS_PARAM)
            .map(|(_, value)| value)
    });
    parse_groups_param(value, base_iri)
}

// =============================================================================
// TESTS
// =============================================================================
