//! # SPARQL Boundary
//!
//! The hierarchy query and the typed view of its JSON results.
//!
//! Results arrive as `{ results: { bindings: [ { var: { value } } ] } }`,
//! with any variable absent on any row. [`rows_from_results`] turns each
//! binding into a [`Row`] with explicit optional fields before anything
//! reaches the materializer.

use crate::primitives::MAX_LANGUAGE_LENGTH;
use crate::{AgricheckError, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// QUERY VARIABLES
// =============================================================================

/// Projected variable names of the hierarchy query.
pub mod vars {
    pub const SUBJECT: &str = "s";
    pub const SUBJECT_TYPE: &str = "sType";
    pub const SUBJECT_LABEL: &str = "sLabel";
    pub const SUBJECT_COMMENT: &str = "sComment";
    pub const HIERARCHY_LEVEL: &str = "hierarchyLevel";
    pub const SUB_GROUP: &str = "subGroup";
    pub const SUB_GROUP_LABEL: &str = "subGroupLabel";
    pub const SUB_GROUP_COMMENT: &str = "subGroupComment";
    pub const SUPER_GROUP: &str = "superGroup";
    pub const INSPECTION_POINT: &str = "inspectionPoint";
    pub const INSPECTION_POINT_LABEL: &str = "inspectionPointLabel";
    pub const INSPECTION_POINT_COMMENT: &str = "inspectionPointComment";
    pub const PARENT_GROUP: &str = "parentGroup";
}

// =============================================================================
// QUERY TEXT
// =============================================================================

const HIERARCHY_QUERY_TEMPLATE: &str = r#"PREFIX :           <https://agriculture.ld.admin.ch/inspection/>
PREFIX dcterms:    <http://purl.org/dc/terms/>
PREFIX schema:     <http://schema.org/>
PREFIX rdfs:       <http://www.w3.org/2000/01/rdf-schema#>

SELECT
  ?s ?sType ?sLabel ?sComment ?hierarchyLevel
  ?subGroup ?subGroupLabel ?subGroupComment
  ?superGroup
  ?inspectionPoint ?inspectionPointLabel ?inspectionPointComment
  ?parentGroup
WHERE {
  ?s a ?sType .
  FILTER(?sType IN (dcterms:Collection, :InspectionPoint))

  OPTIONAL { ?s rdfs:label   ?sLabel   . FILTER(LANG(?sLabel)   = "@LANG@") }
  OPTIONAL { ?s rdfs:comment ?sComment . FILTER(LANG(?sComment) = "@LANG@") }
  OPTIONAL { ?s :hierarchyLevel ?hierarchyLevel }

  OPTIONAL {
    ?s schema:hasPart ?subGroup .
    OPTIONAL { ?subGroup rdfs:label   ?subGroupLabel   . FILTER(LANG(?subGroupLabel)   = "@LANG@") }
    OPTIONAL { ?subGroup rdfs:comment ?subGroupComment . FILTER(LANG(?subGroupComment) = "@LANG@") }
  }

  OPTIONAL { ?s schema:isPartOf ?superGroup }

  OPTIONAL {
    ?s :includesInspectionPoints ?inspectionPoint .
    OPTIONAL { ?inspectionPoint rdfs:label   ?inspectionPointLabel   . FILTER(LANG(?inspectionPointLabel)   = "@LANG@") }
    OPTIONAL { ?inspectionPoint rdfs:comment ?inspectionPointComment . FILTER(LANG(?inspectionPointComment) = "@LANG@") }
  }

  OPTIONAL { ?s :belongsToGroup ?parentGroup }
}
"#;

/// Validate a language tag before it is spliced into query text.
///
/// Accepts non-empty tags of ASCII letters, digits and `-`.
pub fn validate_language(lang: &str) -> Result<(), AgricheckError> {
    let well_formed = !lang.is_empty()
        && lang.len() <= MAX_LANGUAGE_LENGTH
        && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(AgricheckError::InvalidLanguage(lang.to_string()))
    }
}

/// Build the full-hierarchy query with labels filtered to `lang`.
pub fn hierarchy_query(lang: &str) -> Result<String, AgricheckError> {
    validate_language(lang)?;
    Ok(HIERARCHY_QUERY_TEMPLATE.replace("@LANG@", lang))
}

// =============================================================================
// RESULT DOCUMENT
// =============================================================================

/// `application/sparql-results+json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<ResultHead>,
    pub results: ResultSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// One result row: variable name to bound term.
pub type Binding = BTreeMap<String, BindingValue>;

/// A bound RDF term. Only `value` is read by the materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingValue {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub term_type: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl BindingValue {
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            term_type: Some("literal".to_string()),
            lang: None,
        }
    }

    #[must_use]
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            term_type: Some("uri".to_string()),
            lang: None,
        }
    }
}

impl SparqlResults {
    /// Parse a results document from raw JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, AgricheckError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AgricheckError::SerializationError(format!("SPARQL results: {}", e)))
    }

    /// Serialize back to pretty JSON (used for offline snapshots).
    pub fn to_json_pretty(&self) -> Result<String, AgricheckError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AgricheckError::SerializationError(e.to_string()))
    }

    /// Build a document from plain bindings.
    #[must_use]
    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        Self {
            head: None,
            results: ResultSet { bindings },
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.results.bindings.len()
    }
}

// =============================================================================
// BINDING -> ROW
// =============================================================================

/// Convert a single binding into a typed row.
#[must_use]
pub fn row_from_binding(binding: &Binding) -> Row {
    let v = |key: &str| binding.get(key).map(|b| b.value.clone());
    Row {
        subject: v(vars::SUBJECT),
        subject_type: v(vars::SUBJECT_TYPE),
        subject_label: v(vars::SUBJECT_LABEL),
        subject_comment: v(vars::SUBJECT_COMMENT),
        hierarchy_level: v(vars::HIERARCHY_LEVEL),
        sub_group: v(vars::SUB_GROUP),
        sub_group_label: v(vars::SUB_GROUP_LABEL),
        sub_group_comment: v(vars::SUB_GROUP_COMMENT),
        super_group: v(vars::SUPER_GROUP),
        inspection_point: v(vars::INSPECTION_POINT),
        inspection_point_label: v(vars::INSPECTION_POINT_LABEL),
        inspection_point_comment: v(vars::INSPECTION_POINT_COMMENT),
        parent_group: v(vars::PARENT_GROUP),
    }
}

/// Convert every binding of a results document into typed rows.
#[must_use]
pub fn rows_from_results(results: &SparqlResults) -> Vec<Row> {
    results.results.bindings.iter().map(row_from_binding).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_splices_language() {
        let q = hierarchy_query("fr").expect("query");
        assert!(q.contains(r#"LANG(?sLabel)   = "fr""#));
        assert!(!q.contains("@LANG@"));
    }

    #[test]
    fn query_rejects_injection() {
        assert!(hierarchy_query(r#"de") } DROP"#).is_err());
        assert!(hierarchy_query("").is_err());
        assert!(hierarchy_query("de-CH").is_ok());
    }

    #[test]
    fn parses_sparql_json() {
        let json = br#"{
            "head": { "vars": ["s", "sType", "sLabel"] },
            "results": { "bindings": [
                { "s": { "type": "uri", "value": "https://x.org/C1" },
                  "sType": { "type": "uri", "value": "http://purl.org/dc/terms/Collection" },
                  "sLabel": { "type": "literal", "xml:lang": "de", "value": "Felder" } },
                { "s": { "type": "uri", "value": "https://x.org/P1" } }
            ] }
        }"#;

        let results = SparqlResults::from_json(json).expect("parse");
        let rows = rows_from_results(&results);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].subject.as_deref(), Some("https://x.org/C1"));
        assert_eq!(rows[0].subject_label.as_deref(), Some("Felder"));
        assert_eq!(rows[1].subject_type, None);
        assert_eq!(rows[1].sub_group, None);
    }

    #[test]
    fn rejects_wrong_shape() {
        let err = SparqlResults::from_json(br#"{"boolean": true}"#);
        assert!(matches!(err, Err(AgricheckError::SerializationError(_))));
    }
}
